//! Projection builder
//!
//! Assembles the externally visible result from a resolved cluster. The
//! ordering is a deliberate contract: the survivor's own identifiers come
//! first in each array, the rest follow in ascending `(created_at, id)`
//! order, with first-seen-wins deduplication. Deduplication uses ordered
//! linear containers rather than hash sets because callers rely on the
//! stable chronological order to detect what is newest.

use idlink_common::Contact;

use super::IdentityProjection;

/// Build the identity projection for a resolved cluster (pure).
pub fn project(survivor: &Contact, members: &[Contact]) -> IdentityProjection {
    let mut emails: Vec<String> = Vec::new();
    let mut phone_numbers: Vec<String> = Vec::new();

    push_unique(&mut emails, survivor.email.as_ref());
    push_unique(&mut phone_numbers, survivor.phone.as_ref());

    let mut rest: Vec<&Contact> = members.iter().filter(|c| c.id != survivor.id).collect();
    rest.sort_by_key(|c| c.creation_key());

    let mut secondary_contact_ids = Vec::with_capacity(rest.len());
    for contact in rest {
        push_unique(&mut emails, contact.email.as_ref());
        push_unique(&mut phone_numbers, contact.phone.as_ref());
        secondary_contact_ids.push(contact.id);
    }

    IdentityProjection {
        primary_contact_id: survivor.id,
        emails,
        phone_numbers,
        secondary_contact_ids,
    }
}

fn push_unique(values: &mut Vec<String>, value: Option<&String>) {
    if let Some(v) = value {
        if !values.iter().any(|existing| existing == v) {
            values.push(v.clone());
        }
    }
}
