//! Member operations.

use crate::{
    entities::{Member, NewMember},
    errors::{Error, Result},
    http::{ApiClient, Transport},
};
use tracing::{info, instrument};

const MEMBERS_PATH: &str = "/api/members";

/// Retrieves all household members.
pub async fn list_members<T: Transport>(api: &ApiClient<T>) -> Result<Vec<Member>> {
    api.get_json(MEMBERS_PATH).await
}

/// Creates a member.
///
/// # Errors
/// [`Error::Validation`] for a blank name, otherwise whatever the server answers.
#[instrument(skip(api))]
pub async fn create_member<T: Transport>(api: &ApiClient<T>, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Please enter a member name".to_string(),
        });
    }
    api.post(
        MEMBERS_PATH,
        &NewMember {
            name: name.to_string(),
        },
    )
    .await?;
    info!("Member '{name}' created");
    Ok(())
}
