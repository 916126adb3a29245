use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pre-generated user fixture, before the service has issued an id or key.
///
/// The first two attributes double as the user's first and last name; the
/// remainder are the attributes embedded in the user's key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserMeta {
    pub policy: Value,
    pub attributes: Vec<String>,
}

/// Request body for the create-user call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub attributes: Vec<String>,
}

impl UserMeta {
    pub fn to_new_user(&self) -> NewUser {
        let mut names = self.attributes.iter();
        let first_name = names.next().cloned().unwrap_or_default();
        let last_name = names.next().cloned().unwrap_or_default();
        NewUser {
            first_name,
            last_name,
            attributes: names.cloned().collect(),
        }
    }
}

/// What the service hands back when it creates a user.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IssuedKey {
    pub user_id: String,
    pub private_key: String,
}

/// A registered user, persisted by the key generation stage for the later ones.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub private_key: String,
    pub policy: Value,
    pub attributes: Vec<String>,
}

impl User {
    pub fn from_issued(meta: &UserMeta, issued: IssuedKey) -> Self {
        Self {
            user_id: issued.user_id,
            private_key: issued.private_key,
            policy: meta.policy.clone(),
            attributes: meta.attributes.clone(),
        }
    }
}

/// An encounter payload. Its fields are opaque to the benchmark apart from
/// the `policy` and `user_id` stamped on before submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Encounter(pub Map<String, Value>);

impl Encounter {
    pub fn stamped_for(&self, user: &User) -> Encounter {
        let mut fields = self.0.clone();
        fields.insert("policy".to_string(), user.policy.clone());
        fields.insert("user_id".to_string(), Value::String(user.user_id.clone()));
        Encounter(fields)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CreatedEncounter {
    pub encounter_id: String,
}

/// An accepted encounter together with the user allowed to read it back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncounterRef {
    pub user: User,
    pub encounter_id: String,
}

/// Request body for the retrieve-encounter call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct KeyProof<'a> {
    pub private_key: &'a str,
}
