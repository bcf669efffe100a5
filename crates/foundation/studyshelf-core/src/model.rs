//! Domain entities.
//!
//! IDs are opaque strings: hex ObjectIds under the MongoDB store, UUIDs
//! under the in-memory store. JSON field names keep the camelCase wire
//! shape the browser client already speaks.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub subject_id: String,
    pub chapter_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub chapter_id: String,
    pub exercise_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which hierarchy node a material hangs off. Exactly one parent, always --
/// the three-nullable-columns shape exists only at the wire and document
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Subject(String),
    Chapter(String),
    Exercise(String),
}

impl ParentRef {
    /// Builds a parent ref from the three optional request fields.
    /// Zero or more than one populated field is a validation error.
    pub fn from_ids(
        subject_id: Option<String>,
        chapter_id: Option<String>,
        exercise_id: Option<String>,
    ) -> Result<Self> {
        let mut candidates = Vec::new();
        if let Some(id) = subject_id {
            candidates.push(ParentRef::Subject(id));
        }
        if let Some(id) = chapter_id {
            candidates.push(ParentRef::Chapter(id));
        }
        if let Some(id) = exercise_id {
            candidates.push(ParentRef::Exercise(id));
        }
        match candidates.len() {
            0 => Err(Error::Validation(
                "At least one of subjectId, chapterId, or exerciseId is required".into(),
            )),
            1 => Ok(candidates.remove(0)),
            _ => Err(Error::Validation(
                "Exactly one of subjectId, chapterId, or exerciseId must be set".into(),
            )),
        }
    }

    /// The `materialType` discriminator on the wire.
    pub fn level(&self) -> &'static str {
        match self {
            ParentRef::Subject(_) => "subject",
            ParentRef::Chapter(_) => "chapter",
            ParentRef::Exercise(_) => "exercise",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ParentRef::Subject(id) | ParentRef::Chapter(id) | ParentRef::Exercise(id) => id,
        }
    }

    pub fn subject_id(&self) -> Option<&str> {
        match self {
            ParentRef::Subject(id) => Some(id),
            _ => None,
        }
    }

    pub fn chapter_id(&self) -> Option<&str> {
        match self {
            ParentRef::Chapter(id) => Some(id),
            _ => None,
        }
    }

    pub fn exercise_id(&self) -> Option<&str> {
        match self {
            ParentRef::Exercise(id) => Some(id),
            _ => None,
        }
    }
}

/// Material payload type. Text is stored inline; image and file live in
/// the object store and `content` holds the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Text,
    Image,
    File,
}

impl MaterialKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(MaterialKind::Text),
            "image" => Ok(MaterialKind::Image),
            "file" => Ok(MaterialKind::File),
            other => Err(Error::Validation(format!(
                "Unknown material type \"{other}\", expected text, image, or file"
            ))),
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, MaterialKind::Text)
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub id: String,
    pub parent: ParentRef,
    pub kind: MaterialKind,
    /// Inline text, or the stored object's URL for image/file kinds.
    pub content: String,
    /// Object-store handle for image/file kinds; None for text.
    pub storage_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Hand-rolled so the tagged ParentRef flattens back into the client's
// materialType + three nullable id fields.
impl Serialize for Material {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Material", 10)?;
        st.serialize_field("id", &self.id)?;
        st.serialize_field("materialType", self.parent.level())?;
        st.serialize_field("subjectId", &self.parent.subject_id())?;
        st.serialize_field("chapterId", &self.parent.chapter_id())?;
        st.serialize_field("exerciseId", &self.parent.exercise_id())?;
        st.serialize_field("type", &self.kind)?;
        st.serialize_field("content", &self.content)?;
        st.serialize_field("storageId", &self.storage_id)?;
        st.serialize_field("createdAt", &self.created_at)?;
        st.serialize_field("updatedAt", &self.updated_at)?;
        st.end()
    }
}

/// Fields for a material create; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub parent: ParentRef,
    pub kind: MaterialKind,
    pub content: String,
    pub storage_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Salted digest, never the raw password. Excluded from every response.
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_ref_requires_exactly_one_id() {
        assert!(ParentRef::from_ids(None, None, None).is_err());
        assert!(ParentRef::from_ids(Some("a".into()), Some("b".into()), None).is_err());

        let parent = ParentRef::from_ids(None, Some("c1".into()), None).unwrap();
        assert_eq!(parent, ParentRef::Chapter("c1".into()));
        assert_eq!(parent.level(), "chapter");
        assert_eq!(parent.id(), "c1");
        assert_eq!(parent.subject_id(), None);
    }

    #[test]
    fn material_kind_parses() {
        assert_eq!(MaterialKind::parse("text").unwrap(), MaterialKind::Text);
        assert_eq!(MaterialKind::parse("image").unwrap(), MaterialKind::Image);
        assert!(MaterialKind::parse("video").is_err());
    }

    #[test]
    fn material_serializes_with_flat_parent_fields() {
        let m = Material {
            id: "m1".into(),
            parent: ParentRef::Exercise("e1".into()),
            kind: MaterialKind::Text,
            content: "Solve 2x=4".into(),
            storage_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["materialType"], "exercise");
        assert_eq!(v["exerciseId"], "e1");
        assert!(v["subjectId"].is_null());
        assert!(v["chapterId"].is_null());
        assert_eq!(v["type"], "text");
        assert_eq!(v["content"], "Solve 2x=4");
    }

    #[test]
    fn role_defaults_to_user() {
        assert_eq!(Role::parse("moderator"), Role::User);
        assert_eq!(Role::parse("admin"), Role::Admin);
    }
}
