//! Profile Store: the user-authored fields fed into generation.

pub mod handlers;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ProfileInput, ProfileRow};
use crate::store::Store;

const MAX_NAME_LEN: usize = 200;
const MAX_FIELD_LEN: usize = 500;
const MAX_ABOUT_LEN: usize = 10_000;

fn clean_optional(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max_len => Err(AppError::Validation(format!(
            "{field} must be at most {max_len} characters"
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Trims every field, turns blank optionals into `None` and requires a full name.
///
/// `api_key` is left untouched here: `None` means "keep the stored key" and an
/// empty string means "remove it", which `save` resolves against the stored row.
pub fn normalize_profile(input: &ProfileInput) -> Result<ProfileInput, AppError> {
    let full_name = input.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    if full_name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Full name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    Ok(ProfileInput {
        full_name: full_name.to_string(),
        city: clean_optional("City", input.city.as_deref(), MAX_FIELD_LEN)?,
        email: clean_optional("Email", input.email.as_deref(), MAX_FIELD_LEN)?,
        phone: clean_optional("Phone", input.phone.as_deref(), MAX_FIELD_LEN)?,
        linkedin: clean_optional("LinkedIn", input.linkedin.as_deref(), MAX_FIELD_LEN)?,
        github: clean_optional("GitHub", input.github.as_deref(), MAX_FIELD_LEN)?,
        about: clean_optional("About", input.about.as_deref(), MAX_ABOUT_LEN)?,
        api_key: input.api_key.as_deref().map(|k| k.trim().to_string()),
    })
}

pub async fn get(store: &dyn Store, identity_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
    store.get_profile(identity_id).await
}

pub async fn save(
    store: &dyn Store,
    identity_id: Uuid,
    input: &ProfileInput,
) -> Result<ProfileRow, AppError> {
    let mut profile = normalize_profile(input)?;

    profile.api_key = match profile.api_key.as_deref() {
        None => store
            .get_profile(identity_id)
            .await?
            .and_then(|existing| existing.api_key),
        Some("") => None,
        Some(key) => Some(key.to_string()),
    };

    store.upsert_profile(identity_id, &profile).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    fn input(full_name: &str) -> ProfileInput {
        ProfileInput {
            full_name: full_name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_trims_and_drops_blanks() {
        let raw = ProfileInput {
            full_name: "  Ada Lovelace ".to_string(),
            city: Some("  London ".to_string()),
            phone: Some("   ".to_string()),
            about: Some("".to_string()),
            ..Default::default()
        };
        let clean = normalize_profile(&raw).unwrap();
        assert_eq!(clean.full_name, "Ada Lovelace");
        assert_eq!(clean.city.as_deref(), Some("London"));
        assert_eq!(clean.phone, None);
        assert_eq!(clean.about, None);
    }

    #[test]
    fn test_normalize_requires_full_name() {
        assert!(matches!(
            normalize_profile(&input("   ")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_profile(&input(&"x".repeat(MAX_NAME_LEN + 1))),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let store = MemoryStore::default();
        let id = uuid::Uuid::new_v4();
        assert!(get(&store, id).await.unwrap().is_none());

        save(&store, id, &input("Ada")).await.unwrap();
        let profile = get(&store, id).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Ada");
        assert!(profile.is_complete());
    }

    #[tokio::test]
    async fn test_api_key_kept_unless_cleared() {
        let store = MemoryStore::default();
        let id = uuid::Uuid::new_v4();

        let with_key = ProfileInput {
            api_key: Some(" sk-test ".to_string()),
            ..input("Ada")
        };
        save(&store, id, &with_key).await.unwrap();
        assert_eq!(
            get(&store, id).await.unwrap().unwrap().api_key.as_deref(),
            Some("sk-test")
        );

        save(&store, id, &input("Ada L.")).await.unwrap();
        let profile = get(&store, id).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Ada L.");
        assert_eq!(profile.api_key.as_deref(), Some("sk-test"));

        let cleared = ProfileInput {
            api_key: Some(String::new()),
            ..input("Ada L.")
        };
        save(&store, id, &cleared).await.unwrap();
        assert_eq!(get(&store, id).await.unwrap().unwrap().api_key, None);
    }
}
