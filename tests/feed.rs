//! Service-level behavior of the feed assembler and follow manager.

mod common;

use std::sync::Arc;

use time::{Duration, macros::datetime};

use brusio::application::feed::{FeedError, FeedFilter, FeedService};
use brusio::application::follows::FollowService;
use brusio::application::pagination::PageToken;

use common::MemoryStore;

const PAGE_SIZE: u32 = 10;

fn feed_service(store: &Arc<MemoryStore>) -> FeedService {
    FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        PAGE_SIZE,
    )
}

fn follow_service(store: &Arc<MemoryStore>) -> FollowService {
    FollowService::new(store.clone(), store.clone())
}

fn minute(index: i64) -> time::OffsetDateTime {
    datetime!(2026-01-01 00:00 UTC) + Duration::minutes(index)
}

#[tokio::test]
async fn global_feed_lists_newest_first() {
    let store = MemoryStore::new();
    let author = store.seed_user("alice", "secret").await;
    let first = store.seed_post_at(&author, None, "first", minute(1)).await;
    let second = store.seed_post_at(&author, None, "second", minute(2)).await;
    let third = store.seed_post_at(&author, None, "third", minute(3)).await;

    let feed = feed_service(&store);
    let slice = feed
        .list(&FeedFilter::All, PageToken::first())
        .await
        .expect("slice");

    let ids: Vec<i64> = slice.posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert!(!slice.no_follows);
}

#[tokio::test]
async fn timestamp_ties_break_by_id_descending() {
    let store = MemoryStore::new();
    let author = store.seed_user("alice", "secret").await;
    let when = minute(5);
    let older = store.seed_post_at(&author, None, "a", when).await;
    let newer = store.seed_post_at(&author, None, "b", when).await;

    let feed = feed_service(&store);
    let slice = feed
        .list(&FeedFilter::All, PageToken::first())
        .await
        .expect("slice");

    let ids: Vec<i64> = slice.posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn eleven_posts_split_into_ten_and_one() {
    let store = MemoryStore::new();
    let author = store.seed_user("alice", "secret").await;
    let mut ids = Vec::new();
    for index in 1..=11 {
        let post = store
            .seed_post_at(&author, None, &format!("post {index}"), minute(index))
            .await;
        ids.push(post.id);
    }

    let feed = feed_service(&store);

    let first_page = feed
        .list(&FeedFilter::All, PageToken(1))
        .await
        .expect("first page");
    let first_ids: Vec<i64> = first_page.posts.iter().map(|post| post.id).collect();
    let expected: Vec<i64> = ids.iter().rev().take(10).copied().collect();
    assert_eq!(first_ids, expected);
    assert!(first_page.window.has_next());
    assert!(!first_page.window.has_prev());

    let second_page = feed
        .list(&FeedFilter::All, PageToken(2))
        .await
        .expect("second page");
    let second_ids: Vec<i64> = second_page.posts.iter().map(|post| post.id).collect();
    assert_eq!(second_ids, vec![ids[0]]);
    assert!(!second_page.window.has_next());
    assert!(second_page.window.has_prev());
}

#[tokio::test]
async fn out_of_range_pages_clamp_to_the_last_page() {
    let store = MemoryStore::new();
    let author = store.seed_user("alice", "secret").await;
    for index in 1..=11 {
        store
            .seed_post_at(&author, None, &format!("post {index}"), minute(index))
            .await;
    }

    let feed = feed_service(&store);

    let last = feed
        .list(&FeedFilter::All, PageToken(2))
        .await
        .expect("last page");
    let clamped = feed
        .list(&FeedFilter::All, PageToken(99))
        .await
        .expect("clamped page");
    assert_eq!(
        clamped.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        last.posts.iter().map(|p| p.id).collect::<Vec<_>>()
    );
    assert_eq!(clamped.window.number, 2);

    // A zero token also lands on the last page; garbage lands on page 1.
    let zero = feed
        .list(&FeedFilter::All, PageToken::parse(Some("0")))
        .await
        .expect("zero token");
    assert_eq!(zero.window.number, 2);

    let garbage = feed
        .list(&FeedFilter::All, PageToken::parse(Some("bogus")))
        .await
        .expect("garbage token");
    assert_eq!(garbage.window.number, 1);
}

#[tokio::test]
async fn empty_corpus_yields_a_single_empty_page() {
    let store = MemoryStore::new();
    let feed = feed_service(&store);

    let slice = feed
        .list(&FeedFilter::All, PageToken(4))
        .await
        .expect("slice");
    assert!(slice.posts.is_empty());
    assert_eq!(slice.window.number, 1);
    assert_eq!(slice.window.total_pages, 1);
}

#[tokio::test]
async fn group_feed_filters_by_group_and_rejects_unknown_slugs() {
    let store = MemoryStore::new();
    let author = store.seed_user("alice", "secret").await;
    let cooking = store.seed_group("cooking", "Cooking").await;
    let grouped = store
        .seed_post_at(&author, Some(&cooking), "in group", minute(1))
        .await;
    store.seed_post_at(&author, None, "ungrouped", minute(2)).await;

    let feed = feed_service(&store);

    let (group, slice) = feed
        .group_feed("cooking", PageToken::first())
        .await
        .expect("group feed");
    assert_eq!(group.id, cooking.id);
    assert_eq!(
        slice.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![grouped.id]
    );

    let err = feed
        .group_feed("missing", PageToken::first())
        .await
        .expect_err("unknown slug");
    assert!(matches!(err, FeedError::UnknownGroup));
}

#[tokio::test]
async fn author_feed_reports_post_count_and_follow_state() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", "secret").await;
    let bob = store.seed_user("bob", "secret").await;
    for index in 1..=3 {
        store
            .seed_post_at(&bob, None, &format!("post {index}"), minute(index))
            .await;
    }

    let feed = feed_service(&store);
    let follows = follow_service(&store);

    follows.follow(&alice, "bob").await.expect("followed");

    let viewed_by_alice = feed
        .author_feed("bob", Some(alice.id), PageToken::first())
        .await
        .expect("author feed");
    assert_eq!(viewed_by_alice.slice.window.total_items, 3);
    assert!(viewed_by_alice.following);

    let viewed_anonymously = feed
        .author_feed("bob", None, PageToken::first())
        .await
        .expect("author feed");
    assert!(!viewed_anonymously.following);

    let err = feed
        .author_feed("nobody", None, PageToken::first())
        .await
        .expect_err("unknown author");
    assert!(matches!(err, FeedError::UnknownAuthor));
}

#[tokio::test]
async fn following_feed_is_the_union_of_followed_authors() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", "secret").await;
    let bob = store.seed_user("bob", "secret").await;
    let carol = store.seed_user("carol", "secret").await;
    let dave = store.seed_user("dave", "secret").await;

    let from_bob = store.seed_post_at(&bob, None, "bob 1", minute(1)).await;
    let from_carol = store.seed_post_at(&carol, None, "carol 1", minute(2)).await;
    store.seed_post_at(&dave, None, "dave 1", minute(3)).await;

    let feed = feed_service(&store);
    let follows = follow_service(&store);

    follows.follow(&alice, "bob").await.expect("followed");
    follows.follow(&alice, "carol").await.expect("followed");

    let slice = feed
        .list(&FeedFilter::Following(alice.id), PageToken::first())
        .await
        .expect("followed feed");
    let ids: Vec<i64> = slice.posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![from_carol.id, from_bob.id]);
    assert!(!slice.no_follows);

    // A viewer with no follows gets the empty slice plus the prompt flag.
    let empty = feed
        .list(&FeedFilter::Following(dave.id), PageToken::first())
        .await
        .expect("empty followed feed");
    assert!(empty.posts.is_empty());
    assert!(empty.no_follows);
}

#[tokio::test]
async fn new_posts_from_followed_authors_become_visible() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", "secret").await;
    let carol = store.seed_user("carol", "secret").await;
    let bob = store.seed_user("bob", "secret").await;

    let feed = feed_service(&store);
    let follows = follow_service(&store);

    follows.follow(&alice, "bob").await.expect("followed");
    follows.follow(&carol, "alice").await.expect("followed");

    let post = store.seed_post_at(&bob, None, "fresh", minute(1)).await;

    let for_alice = feed
        .list(&FeedFilter::Following(alice.id), PageToken::first())
        .await
        .expect("alice feed");
    assert!(for_alice.posts.iter().any(|p| p.id == post.id));

    let for_carol = feed
        .list(&FeedFilter::Following(carol.id), PageToken::first())
        .await
        .expect("carol feed");
    assert!(!for_carol.posts.iter().any(|p| p.id == post.id));
}

#[tokio::test]
async fn self_follow_never_creates_an_edge() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", "secret").await;

    let follows = follow_service(&store);

    follows.follow(&alice, "alice").await.expect("no-op");
    follows.follow(&alice, "alice").await.expect("still a no-op");

    assert!(store.follow_edges().await.is_empty());
    assert!(
        !follows
            .is_following(alice.id, alice.id)
            .await
            .expect("checked")
    );
}

#[tokio::test]
async fn follow_and_unfollow_are_idempotent_in_both_directions() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", "secret").await;
    store.seed_user("bob", "secret").await;

    let follows = follow_service(&store);

    follows.follow(&alice, "bob").await.expect("followed");
    follows.follow(&alice, "bob").await.expect("duplicate no-op");
    assert_eq!(store.follow_edges().await.len(), 1);

    follows.unfollow(&alice, "bob").await.expect("unfollowed");
    follows
        .unfollow(&alice, "bob")
        .await
        .expect("absent edge no-op");

    let bob = store.user_by_name("bob").await;
    assert!(
        !follows
            .is_following(alice.id, bob.id)
            .await
            .expect("checked")
    );
    assert!(store.follow_edges().await.is_empty());
}
