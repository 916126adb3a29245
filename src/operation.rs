//! Descriptors for the three transaction types. Each one knows its endpoint,
//! the status code that means success, and how to map fixtures onto request
//! bodies and response bodies onto captured entities.

use crate::config::ExpectedStatus;
use crate::layout::Stage;
use crate::model::{CreatedEncounter, Encounter, EncounterRef, IssuedKey, KeyProof, User, UserMeta};
use serde_json::Value;

pub trait Operation: Sync {
    type Input: Sync;
    type Output: Send;

    fn stage(&self) -> Stage;
    fn expected_status(&self) -> u16;
    fn path(&self, input: &Self::Input) -> String;
    fn request_body(&self, input: &Self::Input) -> serde_json::Result<Vec<u8>>;
    fn capture(&self, input: &Self::Input, body: &[u8]) -> serde_json::Result<Self::Output>;
}

/// Registers a user and captures the id and private key the service issues.
pub struct KeyGeneration {
    pub expected: u16,
}

impl Operation for KeyGeneration {
    type Input = UserMeta;
    type Output = User;

    fn stage(&self) -> Stage {
        Stage::KeyGeneration
    }

    fn expected_status(&self) -> u16 {
        self.expected
    }

    fn path(&self, _input: &UserMeta) -> String {
        "/user".to_string()
    }

    fn request_body(&self, input: &UserMeta) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&input.to_new_user())
    }

    fn capture(&self, input: &UserMeta, body: &[u8]) -> serde_json::Result<User> {
        let issued: IssuedKey = serde_json::from_slice(body)?;
        Ok(User::from_issued(input, issued))
    }
}

/// An encounter paired with the user who will own it.
#[derive(Debug, Clone)]
pub struct EncounterSubmission {
    pub encounter: Encounter,
    pub user: User,
}

/// Submits an encounter under its owner's policy.
pub struct SaveEncounter {
    pub expected: u16,
}

impl Operation for SaveEncounter {
    type Input = EncounterSubmission;
    type Output = EncounterRef;

    fn stage(&self) -> Stage {
        Stage::SaveEncounter
    }

    fn expected_status(&self) -> u16 {
        self.expected
    }

    fn path(&self, _input: &EncounterSubmission) -> String {
        "/encounters/".to_string()
    }

    fn request_body(&self, input: &EncounterSubmission) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&input.encounter.stamped_for(&input.user))
    }

    fn capture(&self, input: &EncounterSubmission, body: &[u8]) -> serde_json::Result<EncounterRef> {
        let created: CreatedEncounter = serde_json::from_slice(body)?;
        Ok(EncounterRef {
            user: input.user.clone(),
            encounter_id: created.encounter_id,
        })
    }
}

/// Reads an encounter back, proving access with the owner's private key.
pub struct QueryEncounter {
    pub expected: u16,
}

impl Operation for QueryEncounter {
    type Input = EncounterRef;
    type Output = Value;

    fn stage(&self) -> Stage {
        Stage::QueryEncounter
    }

    fn expected_status(&self) -> u16 {
        self.expected
    }

    fn path(&self, input: &EncounterRef) -> String {
        format!("/encounters/{}", input.encounter_id)
    }

    fn request_body(&self, input: &EncounterRef) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&KeyProof {
            private_key: &input.user.private_key,
        })
    }

    fn capture(&self, _input: &EncounterRef, body: &[u8]) -> serde_json::Result<Value> {
        serde_json::from_slice(body)
    }
}

impl ExpectedStatus {
    pub fn key_generation_op(&self) -> KeyGeneration {
        KeyGeneration { expected: self.key_generation }
    }

    pub fn save_encounter_op(&self) -> SaveEncounter {
        SaveEncounter { expected: self.save_encounter }
    }

    pub fn query_encounter_op(&self) -> QueryEncounter {
        QueryEncounter { expected: self.query_encounter }
    }
}
