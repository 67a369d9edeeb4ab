use menagerie_core::{
    Animal, AnimalPatch, Database, Entity, Owner, OwnerPatch, Repository, SqliteRepository,
    StorageError, Toy, ToyPatch,
};
use uuid::Uuid;

const TOY_ID: &str = "00000000-0000-4000-8000-000000000001";
const OWNER_ID: &str = "00000000-0000-4000-8000-000000000002";
const ANIMAL_ID: &str = "00000000-0000-4000-8000-000000000003";

#[test]
fn add_and_get_roundtrip_preserves_every_field() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::new("Squeaky Bone", "Vinyl");
    let owner = Owner::new("Jane Roe", "jane@example.com");
    repo.add(&toy).unwrap();
    repo.add(&owner).unwrap();
    let animal = Animal::new("Mittens", 3)
        .with_favorite_toy(toy.id())
        .with_owner(owner.id());
    repo.add(&animal).unwrap();

    assert_eq!(repo.get_by_id::<Toy>(toy.id()).unwrap(), Some(toy));
    assert_eq!(repo.get_by_id::<Owner>(owner.id()).unwrap(), Some(owner));
    assert_eq!(repo.get_by_id::<Animal>(animal.id()).unwrap(), Some(animal));
}

#[test]
fn baxter_scenario_reads_back_references() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::with_id(id(TOY_ID), "Chew Toy", "Rubber").unwrap();
    let owner = Owner::with_id(id(OWNER_ID), "John Doe", "john@example.com").unwrap();
    let baxter = Animal::with_id(id(ANIMAL_ID), "Baxter", 5)
        .unwrap()
        .with_favorite_toy(toy.id())
        .with_owner(owner.id());
    repo.add(&toy).unwrap();
    repo.add(&owner).unwrap();
    repo.add(&baxter).unwrap();

    let loaded = repo.get_by_id::<Animal>(id(ANIMAL_ID)).unwrap().unwrap();
    assert_eq!(loaded.name, "Baxter");
    assert_eq!(loaded.age, 5);
    assert_eq!(loaded.favorite_toy_id, Some(id(TOY_ID)));
    assert_eq!(loaded.owner_id, Some(id(OWNER_ID)));
}

#[test]
fn get_by_id_returns_none_for_unknown_id() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    assert!(repo.get_by_id::<Toy>(Uuid::new_v4()).unwrap().is_none());
    assert!(repo.get_by_id::<Owner>(Uuid::new_v4()).unwrap().is_none());
    assert!(repo.get_by_id::<Animal>(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn update_changes_only_patched_field_and_advances_timestamp() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::new("Chew Toy", "Rubber");
    repo.add(&toy).unwrap();

    let updated = repo
        .update::<Toy>(
            toy.id(),
            ToyPatch {
                name: Some("Tug Rope".to_string()),
                ..ToyPatch::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.id(), toy.id());
    assert_eq!(updated.name, "Tug Rope");
    assert_eq!(updated.category, "Rubber");
    assert_eq!(
        updated.timestamps().created_at(),
        toy.timestamps().created_at()
    );
    assert!(updated.timestamps().updated_at() > toy.timestamps().updated_at());

    let stored = repo.get_by_id::<Toy>(toy.id()).unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn update_applies_all_changes_together() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let owner = Owner::new("John Doe", "john@example.com");
    repo.add(&owner).unwrap();

    let updated = repo
        .update::<Owner>(
            owner.id(),
            OwnerPatch {
                name: Some("John Q. Doe".to_string()),
                contact_info: Some("jqd@example.com".to_string()),
            },
        )
        .unwrap()
        .unwrap();

    let stored = repo.get_by_id::<Owner>(owner.id()).unwrap().unwrap();
    assert_eq!(stored.name, "John Q. Doe");
    assert_eq!(stored.contact_info, "jqd@example.com");
    assert_eq!(stored, updated);
}

#[test]
fn update_unknown_id_reports_not_found_without_mutation() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::new("Chew Toy", "Rubber");
    repo.add(&toy).unwrap();

    let result = repo
        .update::<Toy>(
            Uuid::new_v4(),
            ToyPatch {
                name: Some("Ghost".to_string()),
                ..ToyPatch::default()
            },
        )
        .unwrap();
    assert!(result.is_none());
    assert_eq!(repo.list::<Toy>().unwrap(), vec![toy]);
}

#[test]
fn update_with_dangling_reference_fails_and_keeps_row() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let owner = Owner::new("John Doe", "john@example.com");
    repo.add(&owner).unwrap();
    let animal = Animal::new("Baxter", 5).with_owner(owner.id());
    repo.add(&animal).unwrap();

    let err = repo
        .update::<Animal>(
            animal.id(),
            AnimalPatch {
                age: Some(6),
                owner_id: Some(Some(Uuid::new_v4())),
                ..AnimalPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)), "{err}");
    session.rollback().unwrap();

    let stored = repo.get_by_id::<Animal>(animal.id()).unwrap().unwrap();
    assert_eq!(stored, animal);
}

#[test]
fn update_can_clear_a_reference() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::new("Chew Toy", "Rubber");
    repo.add(&toy).unwrap();
    let animal = Animal::new("Baxter", 5).with_favorite_toy(toy.id());
    repo.add(&animal).unwrap();

    repo.update::<Animal>(
        animal.id(),
        AnimalPatch {
            favorite_toy_id: Some(None),
            ..AnimalPatch::default()
        },
    )
    .unwrap()
    .unwrap();

    let stored = repo.get_by_id::<Animal>(animal.id()).unwrap().unwrap();
    assert_eq!(stored.favorite_toy_id, None);
    assert_eq!(stored.age, 5);
}

#[test]
fn delete_then_get_returns_none() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let owner = Owner::new("John Doe", "john@example.com");
    repo.add(&owner).unwrap();

    let removed = repo.delete::<Owner>(owner.id()).unwrap();
    assert_eq!(removed, Some(owner.clone()));
    assert!(repo.get_by_id::<Owner>(owner.id()).unwrap().is_none());
}

#[test]
fn delete_unknown_id_reports_not_found() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    assert!(repo.delete::<Animal>(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn delete_of_referenced_toy_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::new("Chew Toy", "Rubber");
    repo.add(&toy).unwrap();
    repo.add(&Animal::new("Baxter", 5).with_favorite_toy(toy.id()))
        .unwrap();

    let err = repo.delete::<Toy>(toy.id()).unwrap_err();
    assert!(err.is_constraint_violation(), "{err}");
    session.rollback().unwrap();
    assert!(repo.get_by_id::<Toy>(toy.id()).unwrap().is_some());
}

#[test]
fn add_with_dangling_owner_fails_and_persists_nothing() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let orphan = Animal::new("Stray", 2).with_owner(Uuid::new_v4());
    let err = repo.add(&orphan).unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)), "{err}");
    session.rollback().unwrap();

    assert!(repo.get_by_id::<Animal>(orphan.id()).unwrap().is_none());
    assert!(repo.list::<Animal>().unwrap().is_empty());
}

#[test]
fn add_with_duplicate_id_is_a_constraint_violation() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let toy = Toy::with_id(id(TOY_ID), "Chew Toy", "Rubber").unwrap();
    repo.add(&toy).unwrap();

    let clash = Toy::with_id(id(TOY_ID), "Other", "Plush").unwrap();
    let err = repo.add(&clash).unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)), "{err}");
    session.rollback().unwrap();

    assert_eq!(repo.get_by_id::<Toy>(id(TOY_ID)).unwrap(), Some(toy));
}

#[test]
fn list_and_find_by_name_follow_creation_order() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    let first = Animal::new("Baxter", 5);
    let second = Animal::new("Baxter", 7);
    let third = Animal::new("Rex", 2);
    repo.add(&first).unwrap();
    repo.add(&second).unwrap();
    repo.add(&third).unwrap();

    session
        .execute(
            "UPDATE animals SET created_at = 3000 WHERE id = ?1;",
            [first.id().to_string()],
        )
        .unwrap();
    session
        .execute(
            "UPDATE animals SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
            [second.id().to_string()],
        )
        .unwrap();
    session.commit().unwrap();

    let names: Vec<(String, u32)> = repo
        .list::<Animal>()
        .unwrap()
        .into_iter()
        .map(|animal| (animal.name, animal.age))
        .collect();
    assert_eq!(names[0], ("Baxter".to_string(), 7));

    let found = repo.find_by_name::<Animal>("Baxter").unwrap().unwrap();
    assert_eq!(found.id(), second.id());
    assert!(repo.find_by_name::<Animal>("Nobody").unwrap().is_none());
}

#[test]
fn corrupt_rows_surface_as_invalid_data() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let repo = SqliteRepository::new(&session);

    session
        .execute(
            "INSERT INTO toys (id, name, toy_type, created_at, updated_at)
             VALUES ('not-a-uuid', 'Broken', 'Rubber', 1, 1);",
            [],
        )
        .unwrap();
    session.commit().unwrap();

    let err = repo.list::<Toy>().unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)), "{err}");
}

fn id(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap()
}
