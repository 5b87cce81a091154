use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use gymbook::{
    domain::{ActorContext, GatewayResponse, GymStatus, PaymentStatus, PaymentType},
    error::AppError,
    payments::SignatureVerifier,
    repository::{
        GymRepository, PaymentRepository, SqliteGymRepository, SqlitePaymentRepository,
        SqliteUserRepository, UserRepository,
    },
    service::PaymentService,
};

const GATEWAY_SECRET: &str = "test-gateway-secret";

struct Fixture {
    pool: SqlitePool,
    service: PaymentService,
    actor: ActorContext,
}

async fn setup() -> anyhow::Result<Fixture> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_repo = SqliteUserRepository::new(pool.clone());
    let gym_repo = SqliteGymRepository::new(pool.clone());

    let user = user_repo
        .create("member@example.com", "not-a-real-hash", "Test Member")
        .await?;
    let gym = gym_repo.create("Test Gym", GymStatus::Active).await?;

    let service = PaymentService::new(
        Arc::new(SqlitePaymentRepository::new(pool.clone())),
        Arc::new(SqliteGymRepository::new(pool.clone())),
        Some(SignatureVerifier::new(GATEWAY_SECRET.to_string())),
    );

    Ok(Fixture {
        pool,
        service,
        actor: ActorContext::new(user.id, gym.id),
    })
}

fn signed_response(order_id: &str, payment_id: &str, method: &str) -> GatewayResponse {
    let signature = SignatureVerifier::new(GATEWAY_SECRET.to_string()).sign(order_id, payment_id);
    GatewayResponse {
        payment_id: payment_id.to_string(),
        order_id: Some(order_id.to_string()),
        signature: Some(signature),
        payment_method: Some(method.to_string()),
    }
}

async fn status_of(pool: &SqlitePool, id: i64) -> anyhow::Result<String> {
    Ok(
        sqlx::query_scalar::<_, String>("SELECT status FROM payments WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?,
    )
}

#[tokio::test]
async fn test_initialize_process_cancel_scenario() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Visit, Some(42))
        .await?;
    assert_eq!(status_of(&f.pool, id).await?, "pending");

    let payment = f
        .service
        .process(&f.actor, id, signed_response("xyz", "abc", "razorpay"))
        .await?;
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.transaction_id.as_deref(), Some("abc"));
    assert_eq!(payment.payment_method.as_deref(), Some("razorpay"));
    assert!(payment.paid_at.is_some());

    // A completed payment cannot be cancelled; the row is untouched.
    let err = f.service.cancel(&f.actor, id, "test").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(status_of(&f.pool, id).await?, "completed");

    Ok(())
}

#[tokio::test]
async fn test_initialize_maps_payment_type_to_related_entity() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 1000, 1000, PaymentType::Membership, Some(7))
        .await?;

    let repo = SqlitePaymentRepository::new(f.pool.clone());
    let payment = repo.find_by_id(id).await?.unwrap();
    assert_eq!(
        payment.related_entity_type.map(|t| t.as_str()),
        Some("plan")
    );
    assert_eq!(payment.related_entity_id, Some(7));

    // Untyped payments carry no related entity even when an id is supplied.
    let id = f
        .service
        .initialize(&f.actor, 1000, 1000, PaymentType::Other, Some(7))
        .await?;
    let payment = repo.find_by_id(id).await?.unwrap();
    assert_eq!(payment.related_entity_type, None);
    assert_eq!(payment.related_entity_id, None);

    Ok(())
}

#[tokio::test]
async fn test_initialize_rejects_inactive_gym() -> anyhow::Result<()> {
    let f = setup().await?;

    let gym_repo = SqliteGymRepository::new(f.pool.clone());
    let inactive = gym_repo.create("Closed Gym", GymStatus::Inactive).await?;

    let actor = ActorContext::new(f.actor.user_id, inactive.id);
    let err = f
        .service
        .initialize(&actor, 500, 500, PaymentType::Visit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Unknown gym behaves the same.
    let actor = ActorContext::new(f.actor.user_id, 9999);
    let err = f
        .service
        .initialize(&actor, 500, 500, PaymentType::Visit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_process_completes_exactly_once() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Visit, None)
        .await?;

    f.service
        .process(&f.actor, id, signed_response("ord", "pay_1", "razorpay"))
        .await?;

    // The second confirmation finds no pending row and fails.
    let err = f
        .service
        .process(&f.actor, id, signed_response("ord", "pay_2", "razorpay"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The original completion is untouched.
    let repo = SqlitePaymentRepository::new(f.pool.clone());
    let payment = repo.find_by_id(id).await?.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.transaction_id.as_deref(), Some("pay_1"));

    Ok(())
}

#[tokio::test]
async fn test_process_rejects_tampered_signature() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Visit, None)
        .await?;

    let mut response = signed_response("xyz", "abc", "razorpay");
    response.signature = Some("0".repeat(64));

    let err = f.service.process(&f.actor, id, response).await.unwrap_err();
    assert!(matches!(err, AppError::Payment(_)));
    assert_eq!(status_of(&f.pool, id).await?, "pending");

    Ok(())
}

#[tokio::test]
async fn test_process_without_signature_skips_verification() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Product, None)
        .await?;

    // Providers without callback signing complete on the ownership guard alone.
    let payment = f
        .service
        .process(
            &f.actor,
            id,
            GatewayResponse {
                payment_id: "txn_direct".to_string(),
                order_id: None,
                signature: None,
                payment_method: Some("cash".to_string()),
            },
        )
        .await?;
    assert_eq!(payment.status, PaymentStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn test_ownership_guard_blocks_other_actors() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Visit, None)
        .await?;

    // Wrong user.
    let stranger = ActorContext::new(f.actor.user_id + 1, f.actor.gym_id);
    let err = f
        .service
        .process(&stranger, id, signed_response("o", "p", "razorpay"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Wrong gym.
    let wrong_gym = ActorContext::new(f.actor.user_id, f.actor.gym_id + 1);
    let err = f.service.cancel(&wrong_gym, id, "nope").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(status_of(&f.pool, id).await?, "pending");

    Ok(())
}

#[tokio::test]
async fn test_cancel_records_reason() -> anyhow::Result<()> {
    let f = setup().await?;

    let id = f
        .service
        .initialize(&f.actor, 500, 450, PaymentType::Service, Some(3))
        .await?;

    let payment = f.service.cancel(&f.actor, id, "changed my mind").await?;
    assert_eq!(payment.status, PaymentStatus::Cancelled);
    assert_eq!(payment.notes.as_deref(), Some("changed my mind"));

    // Terminal: a cancelled payment cannot be completed afterwards.
    let err = f
        .service
        .process(&f.actor, id, signed_response("o", "p", "razorpay"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(status_of(&f.pool, id).await?, "cancelled");

    Ok(())
}

#[tokio::test]
async fn test_initialize_rejects_non_positive_amount() -> anyhow::Result<()> {
    let f = setup().await?;

    let err = f
        .service
        .initialize(&f.actor, 0, 0, PaymentType::Visit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}
