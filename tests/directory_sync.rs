use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use directory_tests::{Harness, closed_addr};
use entity::{EmployeeField, EmployeeFields, EmployeeId};
use platform_api::RemoteError;
use platform_notify::{NotifySettings, WebhookNotifier};
use products_hr::{
    CreateOutcome, DashboardView, Delivery, Directory, NoticeLevel, SyncError, messages,
};
use serde_json::json;

fn ann() -> EmployeeFields {
    EmployeeFields::new("Ann", "Eng", "a@x.com", "555")
}

#[tokio::test]
async fn adding_ann_to_an_empty_directory() -> Result<()> {
    let harness = Harness::start().await;
    let (mut directory, mut notices) = harness.directory();

    directory.refresh().await?;
    let view = DashboardView::new(&directory);
    assert_eq!(view.total, 0);
    assert!(!view.show_table());

    let outcome = directory.create(ann()).await?;
    let CreateOutcome::Created {
        employee,
        notification,
    } = outcome
    else {
        panic!("complete fields must create a record");
    };
    assert!(notification.join().await.is_sent());

    let view = DashboardView::new(&directory);
    assert_eq!(view.total, 1);
    assert!(view.show_table());
    assert_eq!(view.rows[0].employee, &employee);
    assert_eq!(employee.fields(), ann());
    assert_eq!(employee.id, EmployeeId::Int(1), "id comes from the store");

    assert_eq!(
        harness.hook.payloads(),
        vec![json!({ "id": 1, "name": "Ann", "role": "Eng", "email": "a@x.com", "phone": "555" })]
    );
    assert_eq!(
        harness.table.methods(),
        vec![Method::GET, Method::POST, Method::GET]
    );

    assert_eq!(notices.recv().await.unwrap().message, messages::EMPLOYEE_ADDED);
    assert_eq!(notices.recv().await.unwrap().message, messages::EMAIL_SENT);
    Ok(())
}

#[tokio::test]
async fn editing_role_from_eng_to_lead() -> Result<()> {
    let harness = Harness::start().await;
    let ann_id = harness.table.seed(json!({ "name": "Ann", "role": "Eng", "email": "a@x.com", "phone": "555" }));
    let bo_id = harness.table.seed(json!({ "name": "Bo", "role": "Ops", "email": "b@x.com", "phone": "556" }));
    let (mut directory, _notices) = harness.directory();
    directory.refresh().await?;
    let bo_before = directory.get(&EmployeeId::Int(bo_id)).cloned();

    let id = EmployeeId::Int(ann_id);
    directory.begin_edit(&id)?;
    directory.update_edit_field(EmployeeField::Role, "Lead")?;
    directory.save_edit(&id).await?;

    let ann = directory.get(&id).unwrap();
    assert_eq!(ann.fields(), EmployeeFields::new("Ann", "Lead", "a@x.com", "555"));
    assert_eq!(directory.get(&EmployeeId::Int(bo_id)).cloned(), bo_before);
    assert!(directory.edit().is_none());
    Ok(())
}

#[tokio::test]
async fn empty_field_sends_nothing() -> Result<()> {
    let harness = Harness::start().await;
    let (mut directory, mut notices) = harness.directory();

    let mut fields = ann();
    fields.set(EmployeeField::Email, "");
    assert!(matches!(directory.create(fields).await?, CreateOutcome::Skipped));

    assert!(harness.table.requests().is_empty());
    assert!(harness.hook.payloads().is_empty());
    assert!(notices.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn failed_delete_still_refreshes() -> Result<()> {
    let harness = Harness::start().await;
    let id = harness.table.seed(json!({ "name": "Ann", "role": "Eng", "email": "a@x.com", "phone": "555" }));
    let (mut directory, _notices) = harness.directory();
    directory.refresh().await?;

    harness.table.fail_next(Method::DELETE, StatusCode::INTERNAL_SERVER_ERROR);
    let err = directory.remove(&EmployeeId::Int(id)).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(
        harness.table.methods(),
        vec![Method::GET, Method::DELETE, Method::GET]
    );
    assert_eq!(directory.len(), 1, "row survived the failed delete");

    directory.remove(&EmployeeId::Int(id)).await?;
    assert!(directory.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_insert_does_not_notify() -> Result<()> {
    let harness = Harness::start().await;
    harness.table.fail_next(Method::POST, StatusCode::BAD_REQUEST);
    let (mut directory, mut notices) = harness.directory();

    let err = directory.create(ann()).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(harness.table.methods(), vec![Method::POST]);
    assert!(harness.hook.payloads().is_empty());
    assert!(notices.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn insert_without_a_returned_row_is_a_failed_create() -> Result<()> {
    let harness = Harness::start().await;
    harness.table.answer_inserts_with_no_rows();
    let (mut directory, mut notices) = harness.directory();

    let err = directory.create(ann()).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(RemoteError::EmptyInsert)), "{err:?}");
    assert_eq!(harness.table.methods(), vec![Method::POST], "no refresh");
    assert!(directory.is_empty());
    assert!(harness.hook.payloads().is_empty());
    assert!(notices.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn webhook_rejection_is_reported() -> Result<()> {
    let harness = Harness::start().await;
    harness.hook.respond_with(StatusCode::INTERNAL_SERVER_ERROR);
    let (mut directory, mut notices) = harness.directory();

    let outcome = directory.create(ann()).await?;
    assert_eq!(directory.len(), 1, "creation stands even if the email fails");
    let delivery = outcome.into_notification().unwrap().join().await;
    assert!(matches!(delivery, Delivery::Rejected(_)));

    assert_eq!(notices.recv().await.unwrap().message, messages::EMPLOYEE_ADDED);
    let failure = notices.recv().await.unwrap();
    assert_eq!(failure.level, NoticeLevel::Failure);
    assert_eq!(failure.message, messages::EMAIL_REJECTED);
    Ok(())
}

#[tokio::test]
async fn unreachable_webhook_is_an_error_notice() -> Result<()> {
    let harness = Harness::start().await;
    let addr = closed_addr().await;
    let settings = NotifySettings::new(format!("http://{addr}/hook"))?;
    let (mut directory, mut notices) = Directory::new(
        Arc::new(harness.store()),
        Arc::new(WebhookNotifier::new(&settings)?),
    );

    let outcome = directory.create(ann()).await?;
    let delivery = outcome.into_notification().unwrap().join().await;
    assert!(matches!(delivery, Delivery::Failed(_)));

    notices.recv().await.unwrap();
    assert_eq!(notices.recv().await.unwrap().message, messages::EMAIL_ERROR);
    Ok(())
}

#[tokio::test]
async fn concurrent_editors_are_last_write_wins() -> Result<()> {
    let harness = Harness::start().await;
    let id = EmployeeId::Int(
        harness.table.seed(json!({ "name": "Ann", "role": "Eng", "email": "a@x.com", "phone": "555" })),
    );
    let (mut first, _a) = harness.directory();
    let (mut second, _b) = harness.directory();
    first.refresh().await?;
    second.refresh().await?;

    first.begin_edit(&id)?;
    second.begin_edit(&id)?;
    first.update_edit_field(EmployeeField::Role, "Lead")?;
    second.update_edit_field(EmployeeField::Phone, "999")?;
    first.save_edit(&id).await?;
    second.save_edit(&id).await?;

    first.refresh().await?;
    let row = first.get(&id).unwrap();
    assert_eq!(row.role, "Eng", "second save overwrote the first");
    assert_eq!(row.phone, "999");
    Ok(())
}
