//! Parish records other than events: groups, contacts, subscribers,
//! feedback, knowledge-base entries, contact requests and the mission
//! statement.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{EventDefinition, ParishLocation};
use crate::store::Collection;

/// A record kept in one store collection, keyed by `id`.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

impl Record for EventDefinition {
    const COLLECTION: Collection = Collection::Events;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Groups belong to one church; `Both` is never produced by ingestion.
    pub church: ParishLocation,
    #[serde(default)]
    pub meeting_time: String,
    #[serde(default)]
    pub contact_person: String,
}

impl Record for ChurchGroup {
    const COLLECTION: Collection = Collection::Groups;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchContact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_true")]
    pub display_publicly: bool,
}

fn default_true() -> bool {
    true
}

impl Record for ChurchContact {
    const COLLECTION: Collection = Collection::Contacts;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscribed_at: String,
}

impl Record for Subscriber {
    const COLLECTION: Collection = Collection::Subscribers;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Answer to "did you find what you were looking for?"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoundLooking {
    #[default]
    Yes,
    No,
    #[serde(rename = "I'm still looking")]
    StillLooking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub found_looking: FoundLooking,
    #[serde(default)]
    pub improve_website: String,
    #[serde(default)]
    pub add_remove: String,
    pub submitted_at: String,
    #[serde(default)]
    pub page_path: String,
}

impl Record for Feedback {
    const COLLECTION: Collection = Collection::Feedback;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Background material the chat assistant may quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachment_url: String,
    #[serde(default)]
    pub attachment_name: String,
    pub last_updated: String,
}

impl Record for KnowledgeEntry {
    const COLLECTION: Collection = Collection::Knowledge;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A message sent through the "contact us" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub subject: String,
    #[serde(default)]
    pub message: String,
    pub submitted_at: String,
}

impl Record for ContactRequest {
    const COLLECTION: Collection = Collection::Requests;

    fn id(&self) -> &str {
        &self.id
    }
}

/// The single current mission statement. Not keyed: the collection holds one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionStatement {
    pub text: String,
    pub last_updated: String,
}
