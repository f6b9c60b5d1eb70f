//! Integration tests for catalog persistence and read queries
//!
//! Covers the replace-all transaction: idempotence, atomicity under an
//! injected mid-batch failure, quoting, progress reporting and the read
//! side.

use aerial_common::db::catalog::{
    categories_by_kind, category_with_items, replace_catalog, ITEM_BATCH_SIZE,
};
use aerial_common::db::init_database;
use aerial_common::db::models::{Category, CategoryKind, Item};
use aerial_common::events::Progress;
use aerial_common::Error;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let pool = init_database(&dir.path().join("catalog.db"))
        .await
        .expect("init database");
    (pool, dir)
}

fn item(name: &str, url: &str) -> Item {
    Item {
        id: None,
        name: name.to_string(),
        logo: None,
        url: url.to_string(),
    }
}

fn category(name: &str, kind: CategoryKind, items: Vec<Item>) -> Category {
    Category {
        id: None,
        name: name.to_string(),
        kind,
        items,
    }
}

fn sample_catalog() -> Vec<Category> {
    vec![
        category(
            "News",
            CategoryKind::Live,
            vec![
                Item {
                    id: None,
                    name: "CNN".to_string(),
                    logo: Some("http://logo/cnn.png".to_string()),
                    url: "http://h/live/u/p/1.ts".to_string(),
                },
                item("BBC", "http://h/live/u/p/2.ts"),
            ],
        ),
        category(
            "Films",
            CategoryKind::Movie,
            vec![item("Heat", "http://h/movie/u/p/3.mkv")],
        ),
    ]
}

#[tokio::test]
async fn persisted_catalog_reads_back_verbatim() {
    let (pool, _dir) = test_pool().await;

    let stats = replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("replace catalog");
    assert_eq!(stats.categories_written, 2);
    assert_eq!(stats.items_written, 3);

    let live = categories_by_kind(&pool, CategoryKind::Live)
        .await
        .expect("list live");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "News");
    assert!(live[0].items.is_empty(), "listing must not load items");

    let news = category_with_items(&pool, live[0].id.expect("persisted id"))
        .await
        .expect("load category");
    assert_eq!(news.kind, CategoryKind::Live);
    let names: Vec<_> = news.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["CNN", "BBC"]);
    assert_eq!(news.items[0].url, "http://h/live/u/p/1.ts");
    assert_eq!(news.items[0].logo.as_deref(), Some("http://logo/cnn.png"));
    assert_eq!(news.items[1].logo, None);
}

#[tokio::test]
async fn replace_is_idempotent() {
    let (pool, _dir) = test_pool().await;

    replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("first replace");
    replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("second replace");

    let category_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await
        .unwrap();
    let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(category_count, 2);
    assert_eq!(item_count, 3);

    let live = categories_by_kind(&pool, CategoryKind::Live).await.unwrap();
    let news = category_with_items(&pool, live[0].id.unwrap()).await.unwrap();
    assert_eq!(news.items.len(), 2);
}

#[tokio::test]
async fn replace_discards_previous_catalog() {
    let (pool, _dir) = test_pool().await;

    replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("initial catalog");

    let next = vec![category(
        "Documentaries",
        CategoryKind::Series,
        vec![item("Planet", "http://h/series/u/p/9.mp4")],
    )];
    replace_catalog(&pool, &next, |_| {}).await.expect("second catalog");

    assert!(categories_by_kind(&pool, CategoryKind::Live)
        .await
        .unwrap()
        .is_empty());
    let series = categories_by_kind(&pool, CategoryKind::Series).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, "Documentaries");

    let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(item_count, 1);
}

#[tokio::test]
async fn quotes_in_values_round_trip() {
    let (pool, _dir) = test_pool().await;

    let tricky = vec![category(
        "Kids' Shows",
        CategoryKind::Live,
        vec![Item {
            id: None,
            name: "O'Neill's Hour".to_string(),
            logo: Some("http://logo/o'neill.png".to_string()),
            url: "http://h/live/u/p/o'neill.ts".to_string(),
        }],
    )];

    replace_catalog(&pool, &tricky, |_| {}).await.expect("replace");

    let live = categories_by_kind(&pool, CategoryKind::Live).await.unwrap();
    assert_eq!(live[0].name, "Kids' Shows");

    let loaded = category_with_items(&pool, live[0].id.unwrap()).await.unwrap();
    assert_eq!(loaded.items[0].name, "O'Neill's Hour");
    assert_eq!(loaded.items[0].logo.as_deref(), Some("http://logo/o'neill.png"));
    assert_eq!(loaded.items[0].url, "http://h/live/u/p/o'neill.ts");
}

#[tokio::test]
async fn failed_write_leaves_previous_catalog_untouched() {
    let (pool, _dir) = test_pool().await;

    replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("seed catalog");

    // Abort the transaction from inside the storage layer, mid item
    // insert, without touching the persister's code path.
    sqlx::query(
        r#"
        CREATE TRIGGER fail_on_marker BEFORE INSERT ON items
        WHEN NEW.name = 'marker'
        BEGIN
            SELECT RAISE(ABORT, 'injected failure');
        END
        "#,
    )
    .execute(&pool)
    .await
    .expect("create trigger");

    let doomed = vec![
        category(
            "Sports",
            CategoryKind::Live,
            vec![item("ESPN", "http://h/live/u/p/5.ts")],
        ),
        category(
            "Broken",
            CategoryKind::Unknown,
            vec![item("marker", "http://h/u/p/6.ts")],
        ),
    ];

    let err = replace_catalog(&pool, &doomed, |_| {})
        .await
        .expect_err("write must fail");
    assert!(matches!(err, Error::Persist(_)), "got {:?}", err);

    // The pre-refresh data set is still fully visible.
    let live = categories_by_kind(&pool, CategoryKind::Live).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "News");

    let news = category_with_items(&pool, live[0].id.unwrap()).await.unwrap();
    assert_eq!(news.items.len(), 2);

    let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(item_count, 3);
}

#[tokio::test]
async fn progress_percentages_are_monotonic() {
    let (pool, _dir) = test_pool().await;

    // Enough items for several batches in one category.
    let items: Vec<Item> = (0..(ITEM_BATCH_SIZE * 2 + 200))
        .map(|i| item(&format!("Channel {}", i), &format!("http://h/live/u/p/{}.ts", i)))
        .collect();
    let total = items.len();
    let catalog = vec![category("Bulk", CategoryKind::Live, items)];

    let mut events: Vec<Progress> = Vec::new();
    replace_catalog(&pool, &catalog, |progress| events.push(progress))
        .await
        .expect("replace");

    let item_percents: Vec<u8> = events
        .iter()
        .filter(|p| p.message.starts_with("Saving items"))
        .filter_map(|p| p.percent)
        .collect();
    assert_eq!(item_percents.len(), 3, "one event per batch");
    assert!(
        item_percents.windows(2).all(|w| w[0] <= w[1]),
        "percentages must be non-decreasing: {:?}",
        item_percents
    );
    assert_eq!(*item_percents.last().unwrap(), 100);

    let last_items_message = &events
        .iter()
        .filter(|p| p.message.starts_with("Saving items"))
        .last()
        .unwrap()
        .message;
    assert!(last_items_message.contains(&format!("({}/{})", total, total)));

    let category_percents: Vec<u8> = events
        .iter()
        .filter(|p| p.message.starts_with("Saving categories"))
        .filter_map(|p| p.percent)
        .collect();
    assert_eq!(category_percents, [100]);
}

#[tokio::test]
async fn empty_catalog_persists_cleanly() {
    let (pool, _dir) = test_pool().await;

    replace_catalog(&pool, &sample_catalog(), |_| {})
        .await
        .expect("seed catalog");

    let stats = replace_catalog(&pool, &[], |_| {}).await.expect("empty replace");
    assert_eq!(stats.categories_written, 0);
    assert_eq!(stats.items_written, 0);

    assert!(categories_by_kind(&pool, CategoryKind::Live)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn missing_category_is_not_found() {
    let (pool, _dir) = test_pool().await;

    let err = category_with_items(&pool, 9999)
        .await
        .expect_err("must not resolve");
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
}
