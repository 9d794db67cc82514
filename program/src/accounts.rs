//! On-chain [`Store`]: one PDA per record, append-only PDAs for the indexes.
//!
//! Record accounts are looked up by their derived address among the
//! accounts passed to the instruction, created on first write and resized
//! in place, with rent paid by the caller. Index lists are borsh `Vec`s that
//! grow by one element per append without being decoded.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{rent::Rent, Sysvar},
};

use crate::{
    address::RecordKey,
    constants::NO_BLUEPRINT,
    error::{BlueprintError, Result},
    state::{Blueprint, Counters, Hash32, InstanceRecord},
    store::Store,
};

pub struct AccountStore<'a, 'info> {
    program_id: &'a Pubkey,
    payer: &'a AccountInfo<'info>,
    system_program: &'a AccountInfo<'info>,
    counters_account: &'a AccountInfo<'info>,
    counters: Counters,
    records: &'a [AccountInfo<'info>],
}

struct Slot<'a, 'info> {
    account: &'a AccountInfo<'info>,
    /// Derivation seeds, bump last.
    seeds: Vec<Vec<u8>>,
}

impl Slot<'_, '_> {
    fn signer_seeds(&self) -> Vec<&[u8]> {
        self.seeds.iter().map(Vec::as_slice).collect()
    }
}

impl<'a, 'info> AccountStore<'a, 'info> {
    pub fn new(
        program_id: &'a Pubkey,
        payer: &'a AccountInfo<'info>,
        system_program: &'a AccountInfo<'info>,
        counters_account: &'a AccountInfo<'info>,
        counters: Counters,
        records: &'a [AccountInfo<'info>],
    ) -> Self {
        Self {
            program_id,
            payer,
            system_program,
            counters_account,
            counters,
            records,
        }
    }

    fn slot(&self, key: RecordKey) -> Result<Slot<'a, 'info>> {
        let (address, bump) = key.find(self.program_id);
        let account = self
            .records
            .iter()
            .find(|a| *a.key == address)
            .ok_or(BlueprintError::MissingAccount(address))?;
        let mut seeds = key.seeds();
        seeds.push(vec![bump]);
        Ok(Slot { account, seeds })
    }

    fn owns(&self, account: &AccountInfo) -> bool {
        account.owner == self.program_id && !account.data_is_empty()
    }

    fn read<T: BorshDeserialize>(&self, key: RecordKey) -> Result<Option<T>> {
        let slot = self.slot(key)?;
        if !self.owns(slot.account) {
            return Ok(None);
        }
        let data = slot.account.try_borrow_data().map_err(|e| failed(slot.account, e))?;
        T::try_from_slice(&data)
            .map(Some)
            .map_err(|e| failed(slot.account, e))
    }

    fn exists(&self, key: RecordKey) -> Result<bool> {
        Ok(self.owns(self.slot(key)?.account))
    }

    fn write<T: BorshSerialize>(&self, key: RecordKey, value: &T) -> Result<()> {
        let slot = self.slot(key)?;
        let bytes = borsh::to_vec(value).map_err(|e| failed(slot.account, e))?;
        self.fit(&slot, bytes.len())?;
        let mut data = slot.account.try_borrow_mut_data().map_err(|e| failed(slot.account, e))?;
        data.copy_from_slice(&bytes);
        Ok(())
    }

    /// Pushes `item` onto the borsh `Vec` held by the account.
    fn append<T: BorshSerialize>(&self, key: RecordKey, item: &T) -> Result<()> {
        let slot = self.slot(key)?;
        let account = slot.account;
        let item = borsh::to_vec(item).map_err(|e| failed(account, e))?;
        let (start, count) = if self.owns(account) {
            let data = account.try_borrow_data().map_err(|e| failed(account, e))?;
            let prefix = data.get(..4).and_then(|p| <[u8; 4]>::try_from(p).ok());
            let count = prefix
                .map(u32::from_le_bytes)
                .ok_or_else(|| failed(account, "corrupt list header"))?;
            (data.len(), count)
        } else {
            (4, 0)
        };
        let count = count
            .checked_add(1)
            .ok_or_else(|| failed(account, "list is full"))?;

        self.fit(&slot, start + item.len())?;
        let mut data = account.try_borrow_mut_data().map_err(|e| failed(account, e))?;
        data[..4].copy_from_slice(&count.to_le_bytes());
        data[start..].copy_from_slice(&item);
        Ok(())
    }

    /// Leaves the account program-owned and exactly `len` bytes long.
    fn fit(&self, slot: &Slot<'_, 'info>, len: usize) -> Result<()> {
        let account = slot.account;
        if !self.owns(account) {
            return create_pda_account(
                self.program_id,
                self.payer,
                account,
                self.system_program,
                len,
                &slot.signer_seeds(),
            )
            .map_err(|e| failed(account, e));
        }
        if account.data_len() != len {
            self.top_up(account, len).map_err(|e| failed(account, e))?;
            account.realloc(len, false).map_err(|e| failed(account, e))?;
        }
        Ok(())
    }

    fn top_up(&self, account: &AccountInfo<'info>, len: usize) -> ProgramResult {
        let needed = Rent::get()?.minimum_balance(len).saturating_sub(account.lamports());
        if needed == 0 {
            return Ok(());
        }
        invoke(
            &system_instruction::transfer(self.payer.key, account.key, needed),
            &[self.payer.clone(), account.clone(), self.system_program.clone()],
        )
    }

    fn save_counters(&self) -> Result<()> {
        let account = self.counters_account;
        let bytes = borsh::to_vec(&self.counters).map_err(|e| failed(account, e))?;
        let mut data = account.try_borrow_mut_data().map_err(|e| failed(account, e))?;
        data.get_mut(..bytes.len())
            .ok_or_else(|| failed(account, "counters account too small"))?
            .copy_from_slice(&bytes);
        Ok(())
    }
}

impl Store for AccountStore<'_, '_> {
    fn blueprint_count(&self) -> Result<u64> {
        Ok(self.counters.blueprints)
    }

    fn blueprint(&self, id: u64) -> Result<Blueprint> {
        if id == NO_BLUEPRINT || id > self.counters.blueprints {
            return Err(BlueprintError::BlueprintNotFound(id));
        }
        self.read(RecordKey::Blueprint(id))?
            .ok_or(BlueprintError::BlueprintNotFound(id))
    }

    fn blueprint_by_hash(&self, hash: &Hash32) -> Result<u64> {
        Ok(self.read(RecordKey::Hash(hash))?.unwrap_or(NO_BLUEPRINT))
    }

    fn insert_blueprint(&mut self, blueprint: Blueprint) -> Result<()> {
        self.write(RecordKey::Blueprint(blueprint.id), &blueprint)?;
        self.write(RecordKey::Hash(&blueprint.content_hash), &blueprint.id)?;
        self.append(RecordKey::Category(blueprint.category), &blueprint.id)?;
        self.append(RecordKey::Author(&blueprint.author), &blueprint.id)?;
        self.counters.blueprints = blueprint.id;
        self.save_counters()
    }

    fn save_blueprint(&mut self, blueprint: &Blueprint) -> Result<()> {
        self.write(RecordKey::Blueprint(blueprint.id), blueprint)
    }

    fn implementation(&self, blueprint_id: u64) -> Result<Option<Pubkey>> {
        self.read(RecordKey::Binding(blueprint_id))
    }

    fn bind(&mut self, blueprint_id: u64, implementation: Pubkey) -> Result<()> {
        self.write(RecordKey::Binding(blueprint_id), &implementation)
    }

    fn has_instance(&self, address: &Pubkey) -> Result<bool> {
        self.exists(RecordKey::Instance(address))
    }

    fn instance(&self, address: &Pubkey) -> Result<InstanceRecord> {
        self.read(RecordKey::Instance(address))?
            .ok_or(BlueprintError::InstanceNotFound(*address))
    }

    fn insert_instance(&mut self, record: InstanceRecord) -> Result<()> {
        self.write(RecordKey::Instance(&record.address), &record)?;
        self.append(RecordKey::Creator(&record.creator), &record.address)?;
        if record.blueprint_id != NO_BLUEPRINT {
            self.append(RecordKey::Deployed(record.blueprint_id), &record.address)?;
        }
        self.append(RecordKey::Ledger, &record.address)?;
        self.counters.instances += 1;
        self.save_counters()
    }

    fn save_instance(&mut self, record: &InstanceRecord) -> Result<()> {
        self.write(RecordKey::Instance(&record.address), record)
    }

    /// The runtime discards every account write of a failed instruction.
    fn draft(&self) -> Option<Self> {
        None
    }
}

fn failed(account: &AccountInfo, reason: impl ToString) -> BlueprintError {
    BlueprintError::StorageFailed {
        account: *account.key,
        reason: reason.to_string(),
    }
}

/// Creates a program-owned PDA of `space` bytes. Lamports already sent to
/// the address are kept and only topped up to the rent-exempt minimum.
pub(crate) fn create_pda_account<'info>(
    program_id: &Pubkey,
    payer: &AccountInfo<'info>,
    target: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    space: usize,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?.minimum_balance(space);
    if target.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(payer.key, target.key, rent, space as u64, program_id),
            &[payer.clone(), target.clone(), system_program.clone()],
            &[seeds],
        );
    }

    let needed = rent.saturating_sub(target.lamports());
    if needed > 0 {
        invoke(
            &system_instruction::transfer(payer.key, target.key, needed),
            &[payer.clone(), target.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(target.key, space as u64),
        &[target.clone(), system_program.clone()],
        &[seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(target.key, program_id),
        &[target.clone(), system_program.clone()],
        &[seeds],
    )
}

/// Decodes an index list account (`Vec<u64>` of ids or `Vec<Pubkey>` of instances).
pub fn read_list<T: BorshDeserialize>(data: &[u8]) -> std::result::Result<Vec<T>, ProgramError> {
    Vec::<T>::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)
}
