//! Certificate issuance, at most once per completed enrollment

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{certificates, prelude::*};
use crate::services::error::DomainError;

/// Serial format: CERT-YYYYMMDD-XXXXXXXX (issue date + random hex suffix)
fn generate_serial(issue_date: &sea_orm::prelude::DateTimeWithTimeZone) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("CERT-{}-{}", issue_date.format("%Y%m%d"), suffix)
}

/// Issue a certificate for the enrollment unless one already exists.
///
/// Returns the certificate and whether this call created it. The insert uses
/// on-conflict-do-nothing against the unique enrollment_id index, so two
/// concurrent completion triggers still resolve to a single row; the loser
/// reads the winner's row back.
pub async fn issue_if_absent<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: i32,
) -> Result<(certificates::Model, bool), DomainError> {
    if let Some(existing) = find_for_enrollment(conn, enrollment_id).await? {
        return Ok((existing, false));
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let serial = generate_serial(&now);

    let inserted = Certificates::insert(certificates::ActiveModel {
        enrollment_id: Set(enrollment_id),
        serial_number: Set(serial.clone()),
        issue_date: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(certificates::Column::EnrollmentId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    if inserted > 0 {
        tracing::info!(
            "issued certificate {} for enrollment {}",
            serial,
            enrollment_id
        );
    }

    let certificate =
        find_for_enrollment(conn, enrollment_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "certificate for enrollment",
                id: enrollment_id,
            })?;
    Ok((certificate, inserted > 0))
}

pub async fn find_for_enrollment<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: i32,
) -> Result<Option<certificates::Model>, DomainError> {
    Ok(Certificates::find()
        .filter(certificates::Column::EnrollmentId.eq(enrollment_id))
        .one(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_encodes_issue_date_and_suffix() {
        let issue_date: sea_orm::prelude::DateTimeWithTimeZone =
            chrono::DateTime::parse_from_rfc3339("2026-08-30T12:00:00+00:00").unwrap();
        let serial = generate_serial(&issue_date);

        assert!(serial.starts_with("CERT-20260830-"));
        let suffix = serial.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn serials_are_unique_across_calls() {
        let issue_date: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let a = generate_serial(&issue_date);
        let b = generate_serial(&issue_date);
        assert_ne!(a, b);
    }
}
