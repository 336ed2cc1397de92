use crate::{CommandError, DatabaseArgs};
use clap::Parser;
use database::services::linking::LinkingService;
use log::{error, info};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Links waiting program enrollments to existing user accounts
#[derive(Debug, Parser)]
#[command(name = "link_program_enrollments")]
pub struct LinkArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    pub program_uuid: Uuid,

    /// `<external_user_key>:<username>` pairs
    #[arg(required = true, num_args = 1..)]
    pub links: Vec<String>,
}

/// Splits `key:username` pairs on the last colon
///
/// External keys may themselves contain colons; usernames can't.
pub fn parse_links(items: &[String]) -> Result<BTreeMap<String, String>, CommandError> {
    let mut links = BTreeMap::new();
    for item in items {
        let (key, username) = item
            .rsplit_once(':')
            .filter(|(key, username)| !key.is_empty() && !username.is_empty())
            .ok_or_else(|| CommandError::InvalidLink(item.clone()))?;
        if links.insert(key.to_string(), username.to_string()).is_some() {
            return Err(CommandError::DuplicateKey(key.to_string()));
        }
    }
    Ok(links)
}

/// Returns the error message of every learner that wasn't linked
pub async fn run(
    db: &DatabaseConnection,
    args: &LinkArgs,
) -> Result<BTreeMap<String, String>, CommandError> {
    let links = parse_links(&args.links)?;
    let errors = LinkingService::link_program_enrollments(db, args.program_uuid, &links).await?;

    for message in errors.values() {
        error!("{message}");
    }
    info!(
        "Linked {} of {} program enrollments in {}",
        links.len() - errors.len(),
        links.len(),
        args.program_uuid
    );
    Ok(errors)
}

#[cfg(test)]
mod test {
    use super::*;
    use database::test_util::{insert_program, insert_program_enrollment, insert_user, setup_db};
    use models::enrollment_status::ProgramEnrollmentStatus;

    fn items(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_parse_links() {
        let links = parse_links(&items(&["abc:alice", "urn:x:def:bob"])).unwrap();
        assert_eq!(links.get("abc").map(String::as_str), Some("alice"));
        assert_eq!(links.get("urn:x:def").map(String::as_str), Some("bob"));

        assert!(matches!(
            parse_links(&items(&["abc"])),
            Err(CommandError::InvalidLink(_))
        ));
        assert!(matches!(
            parse_links(&items(&["abc:"])),
            Err(CommandError::InvalidLink(_))
        ));
        assert!(matches!(
            parse_links(&items(&["abc:alice", "abc:bob"])),
            Err(CommandError::DuplicateKey(_))
        ));
    }

    #[tokio::test]
    async fn test_run() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        insert_user(&db, "alice", false).await;
        insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;

        let args = LinkArgs::parse_from([
            "link_program_enrollments",
            "--database-url",
            "sqlite::memory:",
            &fixture.program.uuid.to_string(),
            "abc:alice",
            "def:bob",
        ]);
        let errors = run(&db, &args).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("def").map(String::as_str),
            Some("No user found with username bob")
        );
    }
}
