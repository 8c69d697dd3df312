#![cfg(feature = "rusqlite")]

use serde::Deserialize;
use serde_json::json;
use trellis::{Join, Operator, TrellisError};

mod common;

use common::{ids, insert_post, insert_user, setup};

#[tokio::test]
async fn posts_embed_their_author() {
    let db = setup().await;

    let user = db
        .insert("users")
        .values(json!({"email": "a@x.com", "name": "A"}))
        .returning(json!({"id": true}))
        .execute()
        .await
        .unwrap();
    assert_eq!(user, json!({"id": 1}));

    db.insert("posts")
        .values(json!({"authorId": 1, "title": "Hi"}))
        .execute()
        .await
        .unwrap();

    let posts = db
        .find_all("posts")
        .include(json!({"author": true}))
        .execute()
        .await
        .unwrap();

    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post["id"], 1);
    assert_eq!(post["authorId"], 1);
    assert_eq!(post["title"], "Hi");
    assert_eq!(post["author"]["id"], 1);
    assert_eq!(post["author"]["email"], "a@x.com");
    assert_eq!(post["author"]["name"], "A");
}

#[tokio::test]
async fn include_two_levels_deep() {
    let db = setup().await;
    let alice = insert_user(&db, "alice@x.com", "Alice").await;
    let post = insert_post(&db, alice, "First").await;
    db.insert("comments")
        .values(json!([
            {"postId": post, "authorId": alice, "body": "one"},
            {"postId": post, "authorId": alice, "body": "two"}
        ]))
        .execute()
        .await
        .unwrap();

    let comment = db
        .find_one("comments")
        .r#where(json!({"body": {"==": "two"}}))
        .include(json!({"post": {"author": true}}))
        .execute()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(comment["post"]["title"], "First");
    assert_eq!(comment["post"]["author"]["name"], "Alice");
    assert_eq!(comment["post"]["author"]["isActive"], true);
}

#[tokio::test]
async fn broken_link_embeds_null() {
    let db = setup().await;
    let alice = insert_user(&db, "alice@x.com", "Alice").await;

    let user = db
        .find_one("users")
        .r#where(json!({"id": {"==": alice}}))
        .include(json!({"role": true}))
        .execute()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user["role"], serde_json::Value::Null);
}

#[tokio::test]
async fn many_relations_embed_arrays_with_limit() {
    let db = setup().await;
    let alice = insert_user(&db, "alice@x.com", "Alice").await;
    let bob = insert_user(&db, "bob@x.com", "Bob").await;
    for title in ["a", "b", "c"] {
        insert_post(&db, alice, title).await;
    }

    let users = db
        .find_all("users")
        .include(json!({"posts": {"limit": 2}}))
        .order_by(json!({"users.id": "asc"}))
        .execute()
        .await
        .unwrap();

    assert_eq!(ids(&users), vec![alice, bob]);
    assert_eq!(users[0]["posts"].as_array().unwrap().len(), 2);
    assert_eq!(users[1]["posts"], json!([]));

    let users = db
        .find_all("users")
        .include(json!({"posts": {"comments": true}}))
        .r#where(json!({"id": {"==": alice}}))
        .execute()
        .await
        .unwrap();
    let posts = users[0]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|post| post["comments"] == json!([])));
}

#[tokio::test]
async fn self_referencing_relations() {
    let db = setup().await;
    db.insert("entities")
        .values(json!([
            {"id": 1, "kind": "folder", "parentId": null},
            {"id": 2, "kind": "file", "parentId": 1},
            {"id": 3, "kind": "file", "parentId": 1}
        ]))
        .execute()
        .await
        .unwrap();

    let folder = db
        .find_one("entities")
        .r#where(json!({"id": {"==": 1}}))
        .include(json!({"children": true, "parent": true}))
        .execute()
        .await
        .unwrap()
        .unwrap();
    let children = folder["children"].as_array().unwrap();
    assert_eq!(ids(children), vec![2, 3]);
    assert_eq!(folder["parent"], serde_json::Value::Null);

    let file = db
        .find_one("entities")
        .r#where(json!({"id": {"==": 3}}))
        .include(json!({"parent": true}))
        .execute()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file["parent"]["kind"], "folder");
}

#[tokio::test]
async fn filters_order_and_paginate() {
    let db = setup().await;
    for (email, name) in [("a@x", "A"), ("b@x", "B"), ("c@x", "C"), ("d@x", "D")] {
        insert_user(&db, email, name).await;
    }

    let users = db
        .find_all("users")
        .map(json!({"name": "users.name"}))
        .r#where(json!({"$or": [{"name": {"$in": ["A", "B", "D"]}}, {"email": {"$like": "c%"}}]}))
        .order_by(json!({"users.name": "desc"}))
        .limit(2)
        .offset(1)
        .execute()
        .await
        .unwrap();

    assert_eq!(users, vec![json!({"name": "C"}), json!({"name": "B"})]);

    let none = db
        .find_one("users")
        .r#where(json!({"name": {"==": "Z"}}))
        .execute()
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn joins_and_grouping() {
    let db = setup().await;
    let alice = insert_user(&db, "alice@x.com", "Alice").await;
    let bob = insert_user(&db, "bob@x.com", "Bob").await;
    for (author, title) in [(alice, "a1"), (alice, "a2"), (bob, "b1")] {
        insert_post(&db, author, title).await;
    }

    let rows = db
        .find_all("posts")
        .join(Join::inner("users", "author").on("id", Operator::Eq, "posts.authorId"))
        .map(json!({"title": "posts.title", "author": "author.name"}))
        .r#where(json!({"author.name": {"==": "Bob"}}))
        .execute()
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"title": "b1", "author": "Bob"})]);

    let counts = db
        .find_all("posts")
        .map(json!({"authorId": "posts.authorId", "total": {"$raw": "count(*)"}}))
        .group_by(json!({"posts.authorId": true}))
        .order_by(json!({"posts.authorId": "asc"}))
        .execute()
        .await
        .unwrap();
    assert_eq!(
        counts,
        vec![
            json!({"authorId": alice, "total": 2}),
            json!({"authorId": bob, "total": 1})
        ]
    );
}

#[tokio::test]
async fn raw_expressions_with_brackets() {
    let db = setup().await;
    insert_user(&db, "alice@x.com", "Alice").await;

    let rows = db
        .find_all("users")
        .map(json!({
            "first": {"$raw": "json_extract('[7]', '$[0]')"},
            "email": "users.email"
        }))
        .execute()
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"first": 7, "email": "alice@x.com"})]);
}

#[tokio::test]
async fn typed_results() {
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct User {
        id: i64,
        email: String,
        is_active: bool,
        created_at: Option<chrono::DateTime<chrono::Utc>>,
        posts: Vec<Post>,
    }

    #[derive(Debug, Deserialize)]
    struct Post {
        title: String,
    }

    let db = setup().await;
    let alice = insert_user(&db, "alice@x.com", "Alice").await;
    insert_post(&db, alice, "typed").await;

    let users: Vec<User> = db
        .find_all("users")
        .include(json!({"posts": true}))
        .execute_as()
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, alice);
    assert_eq!(users[0].email, "alice@x.com");
    assert!(users[0].is_active);
    assert!(users[0].created_at.is_none());
    assert_eq!(users[0].posts[0].title, "typed");
}

#[tokio::test]
async fn contract_violations_surface_before_io() {
    let db = setup().await;

    let unknown_relation = db
        .find_all("users")
        .include(json!({"followers": true}))
        .execute()
        .await;
    assert!(matches!(
        unknown_relation,
        Err(TrellisError::RelationNotFound { .. })
    ));

    let unknown_column = db
        .find_all("users")
        .r#where(json!({"nickname": {"==": "x"}}))
        .execute()
        .await;
    assert!(matches!(unknown_column, Err(TrellisError::ColumnNotFound(_))));

    let unknown_table = db.find_all("accounts").execute().await;
    assert!(matches!(unknown_table, Err(TrellisError::TableNotFound(_))));
}

#[tokio::test]
async fn includes_embed_every_column_kind() {
    use trellis::columns::{blob, boolean, date, integer, real, text};
    use trellis::{Config, Database, Schema, relations, sqlite_table};

    let files = sqlite_table("files", |t| {
        t.column("id", integer("id").primary_key());
        t.column("name", text("name"));
        t.column("size", real("size"));
        t.column("bytes", blob("bytes"));
        t.column("public", boolean("public"));
        t.column("uploadedAt", date("uploaded_at"));
    })
    .unwrap();
    let links = sqlite_table("links", |t| {
        t.column("id", integer("id").primary_key());
        t.column("fileId", integer("file_id").references("files", "id"));
    })
    .unwrap();
    let schema = Schema::builder()
        .table("files", files.clone())
        .table("links", links.clone())
        .relations("filesRelations", relations(&files, |r| {
            r.many("links", &links);
        }))
        .relations("linksRelations", relations(&links, |r| {
            r.one("file", &files, &["fileId"], &["id"]);
        }))
        .build()
        .unwrap();
    let db = Database::open(&Config::in_memory(), schema).await.unwrap();
    db.create().await.unwrap();

    db.insert("files")
        .values(json!([
            {"id": 1, "name": "a.bin", "size": 1.5, "bytes": [1, 2, 255],
             "public": true, "uploadedAt": "2024-05-01T12:30:00.000Z"},
            {"id": 2, "name": "empty", "size": 0.0, "bytes": [],
             "public": false, "uploadedAt": null},
            {"id": 3, "name": "none", "size": null, "bytes": null,
             "public": null, "uploadedAt": null}
        ]))
        .execute()
        .await
        .unwrap();
    db.insert("links")
        .values(json!([{"fileId": 1}, {"fileId": 2}, {"fileId": 3}]))
        .execute()
        .await
        .unwrap();

    let plain = db.find_all("files").execute().await.unwrap();
    assert_eq!(plain[0]["bytes"], json!([1, 2, 255]));

    let links = db
        .find_all("links")
        .include(json!({"file": true}))
        .execute()
        .await
        .unwrap();
    let embedded: Vec<_> = links.iter().map(|link| link["file"].clone()).collect();
    assert_eq!(embedded, plain);
    assert_eq!(embedded[0]["public"], true);
    assert_eq!(embedded[0]["uploadedAt"], "2024-05-01T12:30:00.000Z");
    assert_eq!(embedded[1]["bytes"], json!([]));
    assert_eq!(embedded[2]["bytes"], json!(null));

    let files = db
        .find_one("files")
        .r#where(json!({"id": {"==": 1}}))
        .include(json!({"links": {"file": true}}))
        .execute()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(files["links"][0]["file"]["bytes"], json!([1, 2, 255]));
}
