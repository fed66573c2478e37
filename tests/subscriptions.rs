//! Subscription store lifecycle: insert, list, delete across users.

use pretty_assertions::assert_eq;

use feedsub::storage::{Database, DatabaseError};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let db = test_db().await;

    let a = db
        .insert_subscription(7, "https://one.example/feed.xml", "One")
        .await
        .unwrap();
    let b = db
        .insert_subscription(7, "https://two.example/atom", "")
        .await
        .unwrap();
    assert!(b.id > a.id);

    let listed = db.list_subscriptions(7).await.unwrap();
    assert_eq!(listed, vec![a.clone(), b.clone()]);

    db.delete_subscription(a.id, 7).await.unwrap();
    assert_eq!(db.list_subscriptions(7).await.unwrap(), vec![b]);

    // Deleting again reports NotFound
    let err = db.delete_subscription(a.id, 7).await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound));
}

#[tokio::test]
async fn test_feed_url_is_unique_across_users() {
    let db = test_db().await;
    db.insert_subscription(1, "https://shared.example/rss", "Shared")
        .await
        .unwrap();

    let err = db
        .insert_subscription(2, "https://shared.example/rss", "Shared")
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateSubscription(ref url) if url == "https://shared.example/rss"));

    let owner = db
        .find_subscription_by_url("https://shared.example/rss")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.user_id, 1);
}

#[tokio::test]
async fn test_delete_requires_ownership() {
    let db = test_db().await;
    let sub = db
        .insert_subscription(1, "https://mine.example/feed", "Mine")
        .await
        .unwrap();

    let err = db.delete_subscription(sub.id, 2).await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound));
    assert_eq!(db.list_subscriptions(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_serialized_subscription_hides_owner() {
    let db = test_db().await;
    let sub = db
        .insert_subscription(3, "https://x.example/feed", "X")
        .await
        .unwrap();

    let value = serde_json::to_value(&sub).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "id": sub.id, "url": "https://x.example/feed", "name": "X" })
    );
}
