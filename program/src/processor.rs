use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    log::sol_log_data,
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvar::{clock::Clock, Sysvar},
};

use crate::{
    accounts::{create_pda_account, AccountStore},
    constants::{SEED_CONFIG, SEED_COUNTERS, SEED_INSTANCE},
    error::BlueprintError,
    event::Event,
    host::{Deployment, Host},
    hub::Hub,
    instruction::BlueprintInstruction,
    state::{Config, Counters, Hash32},
};

pub struct Processor;

enum Creation {
    Proxy { blueprint_id: u64 },
    Direct { raw_payload: Vec<u8>, init_program: Option<Pubkey> },
    Template { blueprint_id: u64 },
}

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], input: &[u8]) -> ProgramResult {
        let ix = BlueprintInstruction::try_from_slice(input)
            .map_err(|_| fail(BlueprintError::InvalidInstruction))?;

        match ix {
            BlueprintInstruction::Initialize => Self::process_initialize(program_id, accounts),
            BlueprintInstruction::SetPaused { paused } => {
                Self::process_admin(program_id, accounts, |config, caller| {
                    config.set_paused(caller, paused)
                })
            }
            BlueprintInstruction::TransferAdmin { new_admin } => {
                Self::process_admin(program_id, accounts, |config, caller| {
                    config.transfer_admin(caller, new_admin)
                })
            }
            BlueprintInstruction::RegisterBlueprint(new) => {
                let id = Self::with_hub(program_id, accounts, |hub, config, host, caller| {
                    hub.register_blueprint(config, host, caller, new)
                })?;
                set_return_data(&id.to_le_bytes());
                Ok(())
            }
            BlueprintInstruction::UpdateMetadata { id, update } => {
                Self::with_hub(program_id, accounts, |hub, config, host, caller| {
                    hub.update_metadata(config, host, caller, id, update)
                })
            }
            BlueprintInstruction::SetActive { id, active } => {
                Self::with_hub(program_id, accounts, |hub, config, host, caller| {
                    hub.set_active(config, host, caller, id, active)
                })
            }
            BlueprintInstruction::BindImplementation { blueprint_id, implementation } => {
                Self::with_hub(program_id, accounts, |hub, config, host, caller| {
                    hub.bind_implementation(config, host, caller, blueprint_id, implementation)
                })
            }
            BlueprintInstruction::DeactivateInstance { address } => {
                Self::with_hub(program_id, accounts, |hub, config, host, caller| {
                    hub.deactivate_instance(config, host, caller, address)
                })
            }
            BlueprintInstruction::CreateProxyInstance { blueprint_id, salt, init_payload } => {
                Self::process_create(program_id, accounts, Creation::Proxy { blueprint_id }, salt, init_payload)
            }
            BlueprintInstruction::CreateDirectInstance { raw_payload, salt, init_payload, init_program } => {
                let creation = Creation::Direct { raw_payload, init_program };
                Self::process_create(program_id, accounts, creation, salt, init_payload)
            }
            BlueprintInstruction::CreateFromTemplate { blueprint_id, salt, init_payload } => {
                Self::process_create(program_id, accounts, Creation::Template { blueprint_id }, salt, init_payload)
            }
        }
    }

    fn process_initialize(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let acc_iter = &mut accounts.iter();
        let admin = next_account_info(acc_iter)?;
        let config_ai = next_account_info(acc_iter)?;
        let counters_ai = next_account_info(acc_iter)?;
        let system_program = next_account_info(acc_iter)?;

        if !admin.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (config_pda, config_bump) = Pubkey::find_program_address(&[SEED_CONFIG], program_id);
        if config_pda != *config_ai.key {
            return Err(ProgramError::InvalidSeeds);
        }
        let (counters_pda, counters_bump) = Pubkey::find_program_address(&[SEED_COUNTERS], program_id);
        if counters_pda != *counters_ai.key {
            return Err(ProgramError::InvalidSeeds);
        }

        create_pda_account(
            program_id,
            admin,
            config_ai,
            system_program,
            Config::LEN,
            &[SEED_CONFIG, &[config_bump]],
        )?;
        store(&Config::new(*admin.key, config_bump), config_ai)?;

        create_pda_account(
            program_id,
            admin,
            counters_ai,
            system_program,
            Counters::LEN,
            &[SEED_COUNTERS, &[counters_bump]],
        )?;
        let counters = Counters {
            bump: counters_bump,
            ..Counters::default()
        };
        store(&counters, counters_ai)?;

        msg!("Initialized: admin={}", admin.key);
        Ok(())
    }

    fn process_admin<F>(program_id: &Pubkey, accounts: &[AccountInfo], op: F) -> ProgramResult
    where
        F: FnOnce(&mut Config, &Pubkey) -> Result<Event, BlueprintError>,
    {
        let acc_iter = &mut accounts.iter();
        let admin = next_account_info(acc_iter)?;
        let config_ai = next_account_info(acc_iter)?;

        if !admin.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut config = load_config(program_id, config_ai)?;
        if config.locked {
            return Err(fail(BlueprintError::Reentrant));
        }
        let event = op(&mut config, admin.key).map_err(fail)?;
        store(&config, config_ai)?;
        emit(&event);
        Ok(())
    }

    /// Runs a registry-side operation: caller, config, counters and system
    /// program, then the record accounts. No CPIs besides the system program.
    fn with_hub<'a, 'info, T, F>(program_id: &'a Pubkey, accounts: &'a [AccountInfo<'info>], op: F) -> Result<T, ProgramError>
    where
        F: FnOnce(
            &mut Hub<AccountStore<'a, 'info>>,
            &mut Config,
            &mut SolanaHost<'a, 'info>,
            &Pubkey,
        ) -> Result<T, BlueprintError>,
    {
        let acc_iter = &mut accounts.iter();
        let caller = next_account_info(acc_iter)?;
        let config_ai = next_account_info(acc_iter)?;
        let counters_ai = next_account_info(acc_iter)?;
        let system_program = next_account_info(acc_iter)?;
        let records = acc_iter.as_slice();

        if !caller.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut config = load_config(program_id, config_ai)?;
        let counters = load_counters(program_id, counters_ai)?;
        let mut hub = Hub::new(AccountStore::new(
            program_id,
            caller,
            system_program,
            counters_ai,
            counters,
            records,
        ));
        let mut host = SolanaHost::new(program_id, Clock::get()?.unix_timestamp, None);

        let out = op(&mut hub, &mut config, &mut host, caller.key).map_err(fail)?;
        host.publish();
        Ok(out)
    }

    fn process_create(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        creation: Creation,
        salt: Hash32,
        init_payload: Vec<u8>,
    ) -> ProgramResult {
        let acc_iter = &mut accounts.iter();
        let creator = next_account_info(acc_iter)?;
        let config_ai = next_account_info(acc_iter)?;
        let counters_ai = next_account_info(acc_iter)?;
        let instance = next_account_info(acc_iter)?;
        let system_program = next_account_info(acc_iter)?;
        let records = acc_iter.as_slice();

        if !creator.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut config = load_config(program_id, config_ai)?;
        config.require_not_paused().map_err(fail)?;
        let counters = load_counters(program_id, counters_ai)?;

        // Persist the lock so an init call cannot come back through this program.
        let mut held = config.clone();
        held.lock().map_err(fail)?;
        store(&held, config_ai)?;

        let deploy = DeployAccounts {
            payer: creator,
            instance,
            system_program,
            others: records,
        };
        let mut host = SolanaHost::new(program_id, Clock::get()?.unix_timestamp, Some(deploy));
        let mut hub = Hub::new(AccountStore::new(
            program_id,
            creator,
            system_program,
            counters_ai,
            counters,
            records,
        ));
        let address = match creation {
            Creation::Proxy { blueprint_id } => {
                hub.create_proxy_instance(&mut config, &mut host, creator.key, blueprint_id, salt, &init_payload)
            }
            Creation::Direct { raw_payload, init_program } => {
                host.init_program = init_program;
                hub.create_direct_instance(&mut config, &mut host, creator.key, &raw_payload, salt, &init_payload)
            }
            Creation::Template { blueprint_id } => {
                hub.create_from_template(&mut config, &mut host, creator.key, blueprint_id, salt, &init_payload)
            }
        }
        .map_err(fail)?;

        store(&config, config_ai)?;
        host.publish();
        set_return_data(address.as_ref());
        Ok(())
    }
}

struct DeployAccounts<'a, 'info> {
    payer: &'a AccountInfo<'info>,
    instance: &'a AccountInfo<'info>,
    system_program: &'a AccountInfo<'info>,
    /// Searched for the program handling the init call.
    others: &'a [AccountInfo<'info>],
}

/// [`Host`] backed by CPIs and sysvars. Events are held back until
/// [`SolanaHost::publish`], after every account write has gone through.
pub(crate) struct SolanaHost<'a, 'info> {
    program_id: &'a Pubkey,
    now: i64,
    deploy: Option<DeployAccounts<'a, 'info>>,
    /// Receives the init call of a direct instance.
    init_program: Option<Pubkey>,
    events: Vec<Event>,
}

impl<'a, 'info> SolanaHost<'a, 'info> {
    fn new(program_id: &'a Pubkey, now: i64, deploy: Option<DeployAccounts<'a, 'info>>) -> Self {
        Self {
            program_id,
            now,
            deploy,
            init_program: None,
            events: Vec::new(),
        }
    }

    fn accounts(&self) -> Result<&DeployAccounts<'a, 'info>, BlueprintError> {
        self.deploy.as_ref().ok_or(BlueprintError::InvalidInstruction)
    }

    fn publish(&self) {
        for event in &self.events {
            emit(event);
        }
    }
}

impl Host for SolanaHost<'_, '_> {
    fn program_id(&self) -> &Pubkey {
        self.program_id
    }

    fn now(&self) -> i64 {
        self.now
    }

    fn deploy(&mut self, deployment: &Deployment) -> Result<(), BlueprintError> {
        let accounts = self.accounts()?;
        if *accounts.instance.key != deployment.address {
            return Err(BlueprintError::InvalidAccount(*accounts.instance.key));
        }
        let failed = |reason: String| BlueprintError::InstantiationFailed {
            address: deployment.address,
            reason,
        };

        let bump = [deployment.bump];
        let seeds: [&[u8]; 4] = [
            SEED_INSTANCE,
            &deployment.final_salt,
            &deployment.code_hash,
            &bump,
        ];
        create_pda_account(
            self.program_id,
            accounts.payer,
            accounts.instance,
            accounts.system_program,
            deployment.code.len(),
            &seeds,
        )
        .map_err(|e| failed(e.to_string()))?;

        let mut data = accounts
            .instance
            .try_borrow_mut_data()
            .map_err(|e| failed(e.to_string()))?;
        data[..deployment.code.len()].copy_from_slice(deployment.code);
        Ok(())
    }

    fn initialize(
        &mut self,
        deployment: &Deployment,
        delegate: Option<&Pubkey>,
        payload: &[u8],
    ) -> Result<(), BlueprintError> {
        let accounts = self.accounts()?;
        let target = delegate
            .copied()
            .or(self.init_program)
            .ok_or(BlueprintError::InvalidPayload("init payload without an init program"))?;
        let program = accounts
            .others
            .iter()
            .find(|a| *a.key == target)
            .ok_or(BlueprintError::MissingAccount(target))?;

        let ix = Instruction {
            program_id: target,
            accounts: vec![AccountMeta::new(deployment.address, true)],
            data: payload.to_vec(),
        };
        let bump = [deployment.bump];
        let seeds: [&[u8]; 4] = [
            SEED_INSTANCE,
            &deployment.final_salt,
            &deployment.code_hash,
            &bump,
        ];
        invoke_signed(&ix, &[accounts.instance.clone(), program.clone()], &[&seeds[..]]).map_err(|e| {
            BlueprintError::InstantiationFailed {
                address: deployment.address,
                reason: e.to_string(),
            }
        })
    }

    fn emit(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

fn emit(event: &Event) {
    msg!("{}", event);
    if let Ok(data) = borsh::to_vec(event) {
        sol_log_data(&[data.as_slice()]);
    }
}

fn fail(e: BlueprintError) -> ProgramError {
    msg!("Error: {}", e);
    e.into()
}

fn check_pda(program_id: &Pubkey, account: &AccountInfo, seed: &[u8]) -> ProgramResult {
    if account.owner != program_id {
        return Err(fail(BlueprintError::InvalidAccount(*account.key)));
    }
    let (pda, _) = Pubkey::find_program_address(&[seed], program_id);
    if pda != *account.key {
        return Err(ProgramError::InvalidSeeds);
    }
    Ok(())
}

fn load_config(program_id: &Pubkey, account: &AccountInfo) -> Result<Config, ProgramError> {
    check_pda(program_id, account, SEED_CONFIG)?;
    read_config(&account.try_borrow_data()?)
}

fn load_counters(program_id: &Pubkey, account: &AccountInfo) -> Result<Counters, ProgramError> {
    check_pda(program_id, account, SEED_COUNTERS)?;
    read_counters(&account.try_borrow_data()?)
}

/// Decodes a config account's data.
pub fn read_config(data: &[u8]) -> Result<Config, ProgramError> {
    Config::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)
}

/// Decodes a counters account's data.
pub fn read_counters(data: &[u8]) -> Result<Counters, ProgramError> {
    Counters::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)
}

fn store<T: BorshSerialize>(value: &T, account: &AccountInfo) -> ProgramResult {
    let data = borsh::to_vec(value).map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
    let mut dst = account.try_borrow_mut_data()?;
    if data.len() > dst.len() {
        return Err(ProgramError::AccountDataTooSmall);
    }
    dst[..data.len()].copy_from_slice(&data);
    Ok(())
}
