use blueprint_factory::{
    address::{code_hash, combine_salt, predict_address, predict_for, proxy_code_hash},
    error::BlueprintError,
    event::Event,
    host::{Host, MemoryHost},
    hub::Hub,
    registry::{MetadataUpdate, NewBlueprint},
    state::{Category, Config, DeployMethod},
    store::MemoryStore,
};
use solana_program::pubkey::Pubkey;

struct World {
    hub: Hub<MemoryStore>,
    config: Config,
    host: MemoryHost,
    admin: Pubkey,
}

impl World {
    fn new() -> Self {
        let admin = Pubkey::new_unique();
        Self {
            hub: Hub::default(),
            config: Config::new(admin, 255),
            host: MemoryHost::new(Pubkey::new_unique()),
            admin,
        }
    }

    fn register(&mut self, author: &Pubkey, hash: u8, category: Category) -> Result<u64, BlueprintError> {
        let new = NewBlueprint {
            name: format!("blueprint {hash}"),
            description: "test".into(),
            version: "0.1.0".into(),
            content_hash: [hash; 32],
            locator: format!("loc{hash}"),
            category,
            tags: vec![],
            init_schema: String::new(),
        };
        self.hub.register_blueprint(&mut self.config, &mut self.host, author, new)
    }

    fn bind(&mut self, id: u64, implementation: Pubkey) {
        let admin = self.admin;
        self.hub
            .bind_implementation(&mut self.config, &mut self.host, &admin, id, implementation)
            .unwrap();
    }

    fn proxy(&mut self, creator: &Pubkey, id: u64, salt: u8, init: &[u8]) -> Result<Pubkey, BlueprintError> {
        self.hub
            .create_proxy_instance(&mut self.config, &mut self.host, creator, id, [salt; 32], init)
    }

    fn direct(&mut self, creator: &Pubkey, payload: &[u8], salt: u8) -> Result<Pubkey, BlueprintError> {
        self.hub
            .create_direct_instance(&mut self.config, &mut self.host, creator, payload, [salt; 32], &[])
    }

    fn deployments(&self, id: u64) -> u64 {
        self.hub.store.registry.get(id).unwrap().deployment_count
    }
}

#[test]
fn register_bind_and_proxy_scenario() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    let implementation = Pubkey::new_unique();

    assert_eq!(w.register(&author, 0x11, Category::Token), Ok(1));
    w.bind(1, implementation);

    let predicted = predict_address(
        w.host.program_id(),
        &combine_salt(&[0x51; 32], &creator),
        &proxy_code_hash(&implementation),
    );
    let address = w.proxy(&creator, 1, 0x51, &[]).unwrap();

    assert_eq!(address, predicted);
    assert_eq!(w.deployments(1), 1);
    assert_eq!(w.hub.store.factory.instances_by_blueprint(1), &[address]);
}

#[test]
fn duplicate_content_fails_regardless_of_metadata() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    w.register(&author, 7, Category::Token).unwrap();

    let err = w.register(&Pubkey::new_unique(), 7, Category::Defi).unwrap_err();
    assert_eq!(err, BlueprintError::DuplicateContent { hash: [7; 32], existing: 1 });
    assert_eq!(w.hub.store.registry.len(), 1);
}

#[test]
fn direct_prediction_matches_creation() {
    let mut w = World::new();
    let creator = Pubkey::new_unique();
    for (salt, payload) in [(0u8, &b"a"[..]), (9, &b"longer payload"[..]), (255, &[0u8; 300][..])] {
        let predicted = predict_for(w.host.program_id(), &creator, &[salt; 32], &code_hash(payload));
        assert_eq!(w.direct(&creator, payload, salt), Ok(predicted));
        assert!(w.hub.store.factory.contains(&predicted));
    }
}

#[test]
fn distinct_creators_never_collide() {
    let mut w = World::new();
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();

    let a = w.direct(&alice, b"same payload", 1).unwrap();
    let b = w.direct(&bob, b"same payload", 1).unwrap();
    assert_ne!(a, b);
}

#[test]
fn same_creator_same_salt_fails_without_overwrite() {
    let mut w = World::new();
    let creator = Pubkey::new_unique();
    let first = w.direct(&creator, b"payload", 1).unwrap();
    let before = w.hub.store.factory.get(&first).unwrap().clone();

    assert_eq!(w.direct(&creator, b"payload", 1), Err(BlueprintError::AlreadyExists(first)));
    assert_eq!(w.hub.store.factory.get(&first).unwrap(), &before);
    assert_eq!(w.hub.store.factory.len(), 1);
}

#[test]
fn two_direct_instances_listed_in_creation_order() {
    let mut w = World::new();
    let creator = Pubkey::new_unique();
    let first = w.direct(&creator, b"payload", 1).unwrap();
    let second = w.direct(&creator, b"payload", 2).unwrap();

    assert_ne!(first, second);
    assert_eq!(w.hub.store.factory.len(), 2);
    assert_eq!(w.hub.store.factory.instances_by_creator(&creator), &[first, second]);
    let record = w.hub.store.factory.get(&second).unwrap();
    assert_eq!(record.method, DeployMethod::Direct);
    assert_eq!(record.blueprint_id, 0);
}

#[test]
fn deployment_count_tracks_only_successes() {
    let mut w = World::new();
    w.host = MemoryHost::new(Pubkey::new_unique()).reject_payload(b"boom");
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    w.register(&author, 1, Category::Game).unwrap();
    w.bind(1, Pubkey::new_unique());

    w.proxy(&creator, 1, 1, b"ok").unwrap();
    assert!(matches!(w.proxy(&creator, 1, 2, b"boom"), Err(BlueprintError::InstantiationFailed { .. })));
    assert!(matches!(w.proxy(&creator, 1, 1, &[]), Err(BlueprintError::AlreadyExists(_))));
    w.proxy(&creator, 1, 3, &[]).unwrap();
    assert_eq!(w.proxy(&creator, 2, 4, &[]), Err(BlueprintError::BlueprintNotFound(2)));

    assert_eq!(w.deployments(1), 2);
    assert_eq!(w.hub.store.factory.len(), 2);
}

#[test]
fn failed_init_leaves_no_trace() {
    let mut w = World::new();
    w.host = MemoryHost::new(Pubkey::new_unique()).reject_payload(b"boom");
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    w.register(&author, 1, Category::Token).unwrap();
    w.bind(1, Pubkey::new_unique());
    let events_before = w.host.events.len();
    let snapshot = w.hub.clone();

    let err = w.proxy(&creator, 1, 8, b"boom").unwrap_err();
    let BlueprintError::InstantiationFailed { address, .. } = err else {
        panic!("unexpected error {err:?}");
    };

    assert_eq!(w.hub, snapshot);
    assert!(w.host.account(&address).is_none());
    assert!(w.host.init_calls.is_empty());
    assert_eq!(w.host.events.len(), events_before);
    assert!(!w.config.locked);

    // The same placement is usable once the init call succeeds.
    assert_eq!(w.proxy(&creator, 1, 8, b"fine"), Ok(address));
}

#[test]
fn inactive_blueprint_blocks_creation_until_reactivated() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    w.register(&author, 1, Category::Token).unwrap();
    w.bind(1, Pubkey::new_unique());

    w.hub.set_active(&mut w.config, &mut w.host, &author, 1, false).unwrap();
    assert_eq!(w.proxy(&creator, 1, 1, &[]), Err(BlueprintError::BlueprintInactive(1)));
    assert_eq!(
        w.hub.create_from_template(&mut w.config, &mut w.host, &creator, 1, [1; 32], &[]),
        Err(BlueprintError::BlueprintInactive(1))
    );

    w.hub.set_active(&mut w.config, &mut w.host, &author, 1, true).unwrap();
    w.proxy(&creator, 1, 1, &[]).unwrap();
    assert_eq!(w.deployments(1), 1);
}

#[test]
fn template_path_uses_proxy_placement() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    let implementation = Pubkey::new_unique();
    w.register(&author, 1, Category::Multisig).unwrap();
    w.bind(1, implementation);

    let predicted = predict_for(w.host.program_id(), &creator, &[4; 32], &proxy_code_hash(&implementation));
    let address = w
        .hub
        .create_from_template(&mut w.config, &mut w.host, &creator, 1, [4; 32], &[])
        .unwrap();
    assert_eq!(address, predicted);
    assert_eq!(w.hub.store.factory.get(&address).unwrap().method, DeployMethod::Template);
    assert_eq!(w.proxy(&creator, 1, 4, &[]), Err(BlueprintError::AlreadyExists(address)));
}

#[test]
fn pause_gates_mutations_but_not_queries() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    w.register(&author, 1, Category::Token).unwrap();
    let admin = w.admin;

    w.config.set_paused(&admin, true).unwrap();
    assert_eq!(w.register(&author, 2, Category::Token), Err(BlueprintError::Paused));
    assert_eq!(
        w.hub.update_metadata(&mut w.config, &mut w.host, &author, 1, MetadataUpdate::default()),
        Err(BlueprintError::Paused)
    );
    assert_eq!(w.direct(&author, b"x", 0), Err(BlueprintError::Paused));
    assert_eq!(w.hub.store.registry.get(1).unwrap().id, 1);
    assert_eq!(w.hub.store.registry.find_by_hash(&[1; 32]), 1);

    w.config.set_paused(&admin, false).unwrap();
    assert_eq!(w.register(&author, 2, Category::Token), Ok(2));
}

#[test]
fn admin_only_binding_and_admin_deactivation() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    let stranger = Pubkey::new_unique();
    w.register(&author, 1, Category::Token).unwrap();

    assert_eq!(
        w.hub.bind_implementation(&mut w.config, &mut w.host, &author, 1, Pubkey::new_unique()),
        Err(BlueprintError::Unauthorized(author))
    );

    let address = w.direct(&creator, b"payload", 0).unwrap();
    assert_eq!(
        w.hub.deactivate_instance(&mut w.config, &mut w.host, &stranger, address),
        Err(BlueprintError::Unauthorized(stranger))
    );
    let admin = w.admin;
    w.hub.deactivate_instance(&mut w.config, &mut w.host, &admin, address).unwrap();
    assert!(!w.hub.store.factory.get(&address).unwrap().active);
}

#[test]
fn events_follow_committed_transitions() {
    let mut w = World::new();
    let author = Pubkey::new_unique();
    let creator = Pubkey::new_unique();
    let implementation = Pubkey::new_unique();
    let admin = w.admin;

    w.register(&author, 3, Category::Nft).unwrap();
    let _ = w.register(&author, 3, Category::Nft);
    w.hub
        .update_metadata(
            &mut w.config,
            &mut w.host,
            &author,
            1,
            MetadataUpdate { name: Some("renamed".into()), ..Default::default() },
        )
        .unwrap();
    w.bind(1, implementation);
    let address = w.proxy(&creator, 1, 0, &[]).unwrap();
    w.hub.deactivate_instance(&mut w.config, &mut w.host, &creator, address).unwrap();
    w.hub.set_active(&mut w.config, &mut w.host, &admin, 1, false).unwrap();

    assert_eq!(
        w.host.events,
        vec![
            Event::BlueprintRegistered { id: 1, author, content_hash: [3; 32], category: Category::Nft },
            Event::BlueprintUpdated { id: 1 },
            Event::ImplementationBound { blueprint_id: 1, implementation },
            Event::InstanceCreated {
                address,
                creator,
                blueprint_id: 1,
                method: DeployMethod::Proxy,
                salt: [0; 32],
            },
            Event::InstanceDeactivated { address, by: creator },
            Event::BlueprintDeactivated { id: 1, by: admin },
        ]
    );
}

#[test]
fn paginated_instances_reassemble_full_listing() {
    let mut w = World::new();
    let creator = Pubkey::new_unique();
    let mut created = Vec::new();
    for salt in 0..10u8 {
        created.push(w.direct(&creator, b"payload", salt).unwrap());
    }

    let (empty, total) = w.hub.store.factory.list_paginated(10, 4);
    assert!(empty.is_empty());
    assert_eq!(total, 10);

    let mut listed = Vec::new();
    for offset in (0..total).step_by(4) {
        listed.extend(w.hub.store.factory.list_paginated(offset, 4).0.iter().map(|r| r.address));
    }
    assert_eq!(listed, created);
}
