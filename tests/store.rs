use std::sync::Arc;

use workshop_bot::db::{models::UserRecord, Store};

use teloxide::types::UserId;

#[tokio::test]
async fn absent_key_has_no_value() {
    let store = Store::offline().await.unwrap();
    let counters = store.map::<i64>("COUNTERS");

    assert_eq!(counters.get("1337").await.unwrap(), None);
    assert!(!counters.contains_key("1337").await.unwrap());
    assert!(counters.is_empty().await.unwrap());
}

#[tokio::test]
async fn writes_are_visible_to_later_reads() {
    let store = Store::offline().await.unwrap();
    let counters = store.map::<i64>("COUNTERS");

    counters.insert("1337", &3).await.unwrap();
    assert_eq!(counters.get("1337").await.unwrap(), Some(3));

    counters.insert("1337", &7).await.unwrap();
    assert_eq!(counters.get("1337").await.unwrap(), Some(7));
    assert_eq!(counters.len().await.unwrap(), 1);

    // Another handle on the same map sees the same data.
    assert_eq!(store.map::<i64>("COUNTERS").get("1337").await.unwrap(), Some(7));
}

#[tokio::test]
async fn maps_are_independent() {
    let store = Store::offline().await.unwrap();
    store.map::<i64>("A").insert("key", &1).await.unwrap();
    store.map::<i64>("B").insert("key", &2).await.unwrap();

    assert_eq!(store.map::<i64>("A").get("key").await.unwrap(), Some(1));
    assert_eq!(store.map::<i64>("B").get("key").await.unwrap(), Some(2));
    assert_eq!(store.map_names().await.unwrap(), vec!["A", "B"]);
}

#[tokio::test]
async fn remove_reports_presence() {
    let store = Store::offline().await.unwrap();
    let map = store.map::<String>("NAMES");
    map.insert("a", &"alpha".to_string()).await.unwrap();

    assert!(map.remove("a").await.unwrap());
    assert!(!map.remove("a").await.unwrap());
    assert_eq!(map.get("a").await.unwrap(), None);
}

#[tokio::test]
async fn entries_keep_first_insertion_order() {
    let store = Store::offline().await.unwrap();
    let users = store.map::<UserRecord>("USERS");
    for (id, name) in [(3, "carol"), (1, "alice"), (2, "bob")] {
        users
            .insert(
                &id.to_string(),
                &UserRecord {
                    id: UserId(id),
                    display_name: name.to_uppercase(),
                    username: Some(name.into()),
                },
            )
            .await
            .unwrap();
    }
    // Overwriting keeps the first position.
    users
        .insert(
            "3",
            &UserRecord {
                id: UserId(3),
                display_name: "Carol".into(),
                username: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(users.keys().await.unwrap(), vec!["3", "1", "2"]);
    let handles: Vec<String> = users
        .values()
        .await
        .unwrap()
        .iter()
        .map(|user| user.handle().to_owned())
        .collect();
    assert_eq!(handles, vec!["Carol", "alice", "bob"]);
}

#[tokio::test]
async fn compute_starts_from_nothing() {
    let store = Store::offline().await.unwrap();
    let counters = store.map::<i64>("COUNTERS");

    let bump = |count: Option<i64>| count.map_or(1, |count| count + 1);
    assert_eq!(counters.compute("1337", bump).await.unwrap(), 1);
    assert_eq!(counters.compute("1337", bump).await.unwrap(), 2);
    assert_eq!(counters.compute("42", bump).await.unwrap(), 1);
    assert_eq!(counters.get("1337").await.unwrap(), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_compute_loses_no_updates() {
    let store = Store::offline().await.unwrap();
    let counters = Arc::new(store.map::<i64>("COUNTERS"));

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let counters = counters.clone();
            tokio::spawn(async move {
                counters
                    .compute("1337", |count| count.map_or(1, |count| count + 1))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut seen = Vec::new();
    for task in tasks {
        seen.push(task.await.unwrap());
    }
    seen.sort();

    assert_eq!(seen, (1..=50).collect::<Vec<i64>>());
    assert_eq!(counters.get("1337").await.unwrap(), Some(50));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_compute_on_disk_loses_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::online(&dir.path().join("bot.db")).await.unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let counters = store.map::<i64>("COUNTERS");
            tokio::spawn(async move {
                counters
                    .compute("1337", |count| count.map_or(1, |count| count + 1))
                    .await
                    .unwrap()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(
        store.map::<i64>("COUNTERS").get("1337").await.unwrap(),
        Some(20)
    );
}

#[tokio::test]
async fn online_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.db");

    {
        let store = Store::online(&path).await.unwrap();
        store.map::<i64>("COUNTERS").insert("1337", &3).await.unwrap();
    }

    let reopened = Store::online(&path).await.unwrap();
    assert_eq!(
        reopened.map::<i64>("COUNTERS").get("1337").await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn clear_wipes_every_map() {
    let store = Store::offline().await.unwrap();
    store.map::<i64>("COUNTERS").insert("1", &1).await.unwrap();
    store
        .map::<String>("NAMES")
        .insert("1", &"x".to_string())
        .await
        .unwrap();

    store.clear().await.unwrap();

    assert!(store.map_names().await.unwrap().is_empty());
    assert_eq!(store.map::<i64>("COUNTERS").get("1").await.unwrap(), None);
}

#[tokio::test]
async fn export_groups_values_by_map() {
    let store = Store::offline().await.unwrap();
    store.map::<i64>("COUNTERS").insert("1337", &3).await.unwrap();
    store
        .map::<UserRecord>("USERS")
        .insert(
            "1337",
            &UserRecord {
                id: UserId(1337),
                display_name: "Foo Bar".into(),
                username: Some("foobar42".into()),
            },
        )
        .await
        .unwrap();

    let dump = store.export().await.unwrap();

    assert_eq!(
        dump,
        serde_json::json!({
            "COUNTERS": { "1337": 3 },
            "USERS": {
                "1337": { "id": 1337, "display_name": "Foo Bar", "username": "foobar42" }
            }
        })
    );
}
