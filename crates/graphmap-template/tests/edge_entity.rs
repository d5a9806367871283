//! Edge mapping through GraphTemplate: get-or-create, properties, deletion.

use graphmap_store::{InMemoryGraphStore, SqliteGraphStore};
use graphmap_template::{
    Direction, EdgeId, Entity, EntityId, GraphTemplate, MappingError, Property,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    id: Option<EntityId>,
    name: String,
    age: u32,
}

impl Person {
    fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age: 10,
        }
    }
}

impl Entity for Person {
    const LABEL: &'static str = "Person";

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Book {
    id: Option<EntityId>,
    name: String,
    age: u32,
}

impl Book {
    fn new(name: &str, age: u32) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age,
        }
    }
}

impl Entity for Book {
    const LABEL: &'static str = "Book";

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}

fn template() -> GraphTemplate {
    GraphTemplate::from_store(Arc::new(InMemoryGraphStore::new()))
}

async fn persisted(template: &GraphTemplate) -> (Person, Book) {
    let person = template.insert(Person::new("Poliana")).await.unwrap();
    let book = Book::new("The Shack", 2007);
    let book = template.insert(book).await.unwrap();
    (person, book)
}

#[tokio::test]
async fn error_when_inbound_is_not_persisted() {
    let template = template();
    let person = template.insert(Person::new("Poliana")).await.unwrap();
    let book = Book::new("The Shack", 2007);

    let err = template.edge(&person, "reads", &book).await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("inbound")));
}

#[tokio::test]
async fn error_when_outbound_is_not_persisted() {
    let template = template();
    let person = Person::new("Poliana");
    let book = Book::new("The Shack", 2007);
    let book = template.insert(book).await.unwrap();

    let err = template.edge(&person, "reads", &book).await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("outbound")));
}

#[tokio::test]
async fn error_when_label_is_empty() {
    let template = template();
    let (person, book) = persisted(&template).await;

    let err = template.edge(&person, "", &book).await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("label")));
}

#[tokio::test]
async fn whitespace_label_and_key_are_accepted() {
    let template = template();
    let (person, book) = persisted(&template).await;

    let mut edge = template.edge(&person, " ", &book).await.unwrap();
    assert_eq!(edge.label(), " ");
    edge.add(" ", 1).await.unwrap();
    edge.add("\t", 2).await.unwrap();
    assert_eq!(edge.get(" "), Some(&json!(1)));
    edge.remove(" ").await.unwrap();
    assert_eq!(edge.properties(), &[Property::of("\t", 2)]);

    let other = template.edge(&person, "reads", &book).await.unwrap();
    assert_ne!(edge.id(), other.id());
}

#[tokio::test]
async fn outbound_is_checked_before_inbound_and_label() {
    let template = template();
    let err = template
        .edge(&Person::new("Poliana"), "", &Book::new("The Shack", 2007))
        .await
        .unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("outbound")));
}

#[tokio::test]
async fn entity_not_found_when_outbound_does_not_resolve() {
    let template = template();
    let mut person = Person::new("Poliana");
    person.set_id(EntityId::from(10));
    let book = Book::new("The Shack", 2007);
    let book = template.insert(book).await.unwrap();

    let err = template.edge(&person, "reads", &book).await.unwrap_err();
    match err {
        MappingError::EntityNotFound { label, id } => {
            assert_eq!(label, "Person");
            assert_eq!(id, EntityId::from("10"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn entity_not_found_when_inbound_does_not_resolve() {
    let template = template();
    let person = template.insert(Person::new("Poliana")).await.unwrap();
    let mut book = Book::new("The Shack", 2007);
    book.set_id(EntityId::from("10"));

    let err = template.edge(&person, "reads", &book).await.unwrap_err();
    assert!(matches!(err, MappingError::EntityNotFound { label, .. } if label == "Book"));
}

#[tokio::test]
async fn entity_not_found_when_id_points_at_another_label() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut fake = Book::new("The Shack", 2007);
    fake.set_id(person.id.clone().unwrap());

    let err = template.edge(&person, "reads", &fake).await.unwrap_err();
    assert!(matches!(err, MappingError::EntityNotFound { .. }));
    assert!(template.edge(&person, "reads", &book).await.is_ok());
}

#[tokio::test]
async fn creates_an_edge() {
    let template = template();
    let (person, book) = persisted(&template).await;

    let edge = template.edge(&person, "reads", &book).await.unwrap();
    assert_eq!(edge.label(), "reads");
    assert_eq!(edge.outbound(), &person);
    assert_eq!(edge.inbound(), &book);
    assert!(edge.is_empty());
    assert_eq!(edge.size(), 0);
    assert!(!edge.id().as_str().is_empty());
}

#[tokio::test]
async fn same_triple_returns_the_same_edge() {
    let template = template();
    let (person, book) = persisted(&template).await;

    let edge = template.edge(&person, "reads", &book).await.unwrap();
    let same_edge = template.edge(&person, "reads", &book).await.unwrap();
    assert_eq!(edge.id(), same_edge.id());
    assert_eq!(edge, same_edge);
    assert_eq!(same_edge.label(), "reads");
}

#[tokio::test]
async fn add_rejects_empty_key_and_null_value() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();

    let err = edge.add("", "Brazil").await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("key")));
    let err = edge.add("where", None::<String>).await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("value")));
    assert!(edge.is_empty());
}

#[tokio::test]
async fn adds_a_property() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();

    edge.add("where", "Brazil").await.unwrap();
    assert!(!edge.is_empty());
    assert_eq!(edge.size(), 1);
    assert_eq!(edge.properties(), &[Property::of("where", "Brazil")]);
}

#[tokio::test]
async fn properties_keep_insertion_order() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();

    edge.add("where", "Brazil").await.unwrap();
    edge.add("when", 2017).await.unwrap();
    edge.add("where", "Portugal").await.unwrap();
    assert_eq!(
        edge.properties(),
        &[Property::of("where", "Portugal"), Property::of("when", 2017)]
    );
}

#[tokio::test]
async fn remove_rejects_empty_key() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.add("where", "Brazil").await.unwrap();

    assert!(!edge.is_empty());
    let err = edge.remove("").await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("key")));
    assert_eq!(edge.size(), 1);
}

#[tokio::test]
async fn removes_a_property_and_keeps_the_edge() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.add("where", "Brazil").await.unwrap();
    assert_eq!(edge.size(), 1);

    edge.remove("where").await.unwrap();
    assert!(edge.is_empty());
    assert_eq!(edge.size(), 0);
    edge.remove("never-set").await.unwrap();

    let same = template.edge(&person, "reads", &book).await.unwrap();
    assert_eq!(same.id(), edge.id());
    assert!(same.is_empty());
}

#[tokio::test]
async fn finds_a_property() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.add("where", "Brazil").await.unwrap();

    assert_eq!(edge.get("where"), Some(&json!("Brazil")));
    assert_eq!(edge.get("when"), None);
}

#[tokio::test]
async fn properties_are_visible_to_other_handles() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    let mut stale = template.edge(&person, "reads", &book).await.unwrap();

    edge.add("where", "Brazil").await.unwrap();
    let fresh = template.edge(&person, "reads", &book).await.unwrap();
    assert_eq!(fresh.get("where"), Some(&json!("Brazil")));

    assert!(stale.is_empty());
    stale.refresh().await.unwrap();
    assert_eq!(stale.size(), 1);
}

#[tokio::test]
async fn handle_reports_last_known_state_until_refreshed() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.add("where", "Brazil").await.unwrap();
    let mut kept = template.edge(&person, "reads", &book).await.unwrap();

    edge.delete().await.unwrap();
    assert_eq!(kept.size(), 1);
    assert!(!kept.is_empty());
    assert_eq!(kept.get("where"), Some(&json!("Brazil")));

    let err = kept.refresh().await.unwrap_err();
    assert!(matches!(err, MappingError::EdgeNotFound(_)));
}

#[tokio::test]
async fn deletes_an_edge() {
    let template = template();
    let (person, book) = persisted(&template).await;

    let edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.delete().await.unwrap();

    let new_edge = template.edge(&person, "reads", &book).await.unwrap();
    assert_ne!(edge.id(), new_edge.id());
    assert!(new_edge.is_empty());
}

#[tokio::test]
async fn deleted_edge_rejects_writes() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.delete().await.unwrap();
    edge.delete().await.unwrap();

    let err = edge.add("where", "Brazil").await.unwrap_err();
    assert!(matches!(err, MappingError::EdgeNotFound(id) if &id == edge.id()));
    let err = edge.refresh().await.unwrap_err();
    assert!(matches!(err, MappingError::EdgeNotFound(_)));
}

#[tokio::test]
async fn finds_updates_and_deletes_entities() {
    let template = template();
    let (mut person, book) = persisted(&template).await;
    let id = person.id.clone().unwrap();

    let found: Option<Person> = template.find(id.clone()).await.unwrap();
    assert_eq!(found.as_ref(), Some(&person));
    let wrong_label: Option<Book> = template.find(id.clone()).await.unwrap();
    assert!(wrong_label.is_none());

    person.age = 31;
    template.update(person.clone()).await.unwrap();
    let found: Person = template.find(id.clone()).await.unwrap().unwrap();
    assert_eq!(found.age, 31);

    let edge = template.edge(&person, "reads", &book).await.unwrap();
    assert!(template.delete::<Person>(id.clone()).await.unwrap());
    assert!(template
        .find_edge_by_id::<Book, Person>(edge.id())
        .await
        .unwrap()
        .is_none());
    assert!(!template.delete::<Person>(id).await.unwrap());
}

#[tokio::test]
async fn insert_and_update_check_identity() {
    let template = template();
    let (person, _) = persisted(&template).await;

    let err = template.insert(person.clone()).await.unwrap_err();
    assert!(matches!(err, MappingError::AlreadyPersisted(_)));

    let err = template.update(Person::new("Nobody")).await.unwrap_err();
    assert!(matches!(err, MappingError::MissingArgument("id")));

    let mut ghost = Person::new("Ghost");
    ghost.set_id("10".into());
    let err = template.update(ghost).await.unwrap_err();
    assert!(matches!(err, MappingError::EntityNotFound { .. }));
}

#[tokio::test]
async fn finds_and_deletes_edges_by_id() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    edge.add("where", "Brazil").await.unwrap();

    let loaded = template
        .find_edge_by_id::<Book, Person>(edge.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, edge);
    assert_eq!(loaded.outbound(), &person);
    assert_eq!(loaded.get("where"), Some(&json!("Brazil")));

    assert!(template.delete_edge(edge.id()).await.unwrap());
    assert!(!template.delete_edge(edge.id()).await.unwrap());
    assert!(template
        .find_edge_by_id::<Book, Person>(&EdgeId::from("missing"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn lists_edges_by_direction_and_label() {
    let template = template();
    let (person, book) = persisted(&template).await;
    let other = Book::new("Dom Casmurro", 1899);
    let other = template.insert(other).await.unwrap();

    template.edge(&person, "reads", &book).await.unwrap();
    template.edge(&person, "wrote", &other).await.unwrap();

    let all = template
        .edges(&person, Direction::Outbound, &[])
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let reads = template
        .edges(&person, Direction::Outbound, &["reads"])
        .await
        .unwrap();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].inbound, book.id.clone().unwrap());
    let inbound = template
        .edges(&book, Direction::Inbound, &[])
        .await
        .unwrap();
    assert_eq!(inbound.len(), 1);
    assert!(template
        .edges(&person, Direction::Inbound, &[])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn sqlite_backed_template_keeps_the_same_contract() {
    let template = GraphTemplate::from_store(Arc::new(SqliteGraphStore::in_memory().unwrap()));
    let (person, book) = persisted(&template).await;

    let mut edge = template.edge(&person, "reads", &book).await.unwrap();
    let same = template.edge(&person, "reads", &book).await.unwrap();
    assert_eq!(edge, same);

    edge.add("where", "Brazil").await.unwrap();
    assert_eq!(edge.properties(), &[Property::of("where", "Brazil")]);
    edge.remove("where").await.unwrap();
    assert!(edge.is_empty());

    edge.delete().await.unwrap();
    let new_edge = template.edge(&person, "reads", &book).await.unwrap();
    assert_ne!(edge.id(), new_edge.id());
}
