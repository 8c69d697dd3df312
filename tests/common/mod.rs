//! Shared schema: roles, users, posts, comments and self-referencing entities.

#![allow(dead_code)]

use serde_json::{Value, json};
use trellis::columns::{boolean, date, integer, text};
use trellis::{Config, Database, RusqliteSession, Schema, Table, relations, sqlite_table};

pub type Db = Database<RusqliteSession>;

pub struct Tables {
    pub roles: Table,
    pub users: Table,
    pub posts: Table,
    pub comments: Table,
    pub entities: Table,
}

pub fn tables() -> Tables {
    let roles = sqlite_table("roles", |t| {
        t.column("id", integer("id").primary_key());
        t.column("name", text("name").unique().not_null());
    })
    .unwrap();

    let users = sqlite_table("users", |t| {
        t.column("id", integer("id").primary_key().autoincrement());
        t.column("email", text("email").unique().not_null());
        t.column("name", text("name"));
        t.column("roleId", integer("role_id").references("roles", "id"));
        t.column("isActive", boolean("is_active").default(true));
        t.column("createdAt", date("created_at"));
    })
    .unwrap();

    let posts = sqlite_table("posts", |t| {
        t.column("id", integer("id").primary_key());
        t.column("authorId", integer("author_id").not_null().references("users", "id"));
        t.column("title", text("title").not_null());
    })
    .unwrap();

    let comments = sqlite_table("comments", |t| {
        t.column("id", integer("id").primary_key());
        t.column("postId", integer("post_id").not_null().references("posts", "id"));
        t.column("authorId", integer("author_id").references("users", "id"));
        t.column("body", text("body"));
    })
    .unwrap();

    let entities = sqlite_table("entities", |t| {
        t.column("id", integer("id").primary_key());
        t.column("kind", text("kind").not_null());
        t.column(
            "parentId",
            integer("parent_id").references_raw("entities(id) on delete cascade"),
        );
    })
    .unwrap();

    Tables {
        roles,
        users,
        posts,
        comments,
        entities,
    }
}

pub fn schema() -> Schema {
    let Tables {
        roles,
        users,
        posts,
        comments,
        entities,
    } = tables();

    Schema::builder()
        .table("roles", roles.clone())
        .table("users", users.clone())
        .table("posts", posts.clone())
        .table("comments", comments.clone())
        .table("entities", entities.clone())
        .relations("rolesRelations", relations(&roles, |r| {
            r.many("users", &users);
        }))
        .relations("usersRelations", relations(&users, |r| {
            r.one("role", &roles, &["roleId"], &["id"]);
            r.many("posts", &posts);
            r.many("comments", &comments);
        }))
        .relations("postsRelations", relations(&posts, |r| {
            r.one("author", &users, &["authorId"], &["id"]);
            r.many("comments", &comments);
        }))
        .relations("commentsRelations", relations(&comments, |r| {
            r.one("post", &posts, &["postId"], &["id"]);
            r.one("author", &users, &["authorId"], &["id"]);
        }))
        .relations("entitiesRelations", relations(&entities, |r| {
            r.one("parent", &entities, &["parentId"], &["id"]);
            r.many("children", &entities);
        }))
        .build()
        .unwrap()
}

/// An in-memory database with every table created.
pub async fn setup() -> Db {
    let db = Database::open(&Config::in_memory(), schema()).await.unwrap();
    db.create().await.unwrap();
    db
}

pub async fn insert_user(db: &Db, email: &str, name: &str) -> i64 {
    let user = db
        .insert("users")
        .values(json!({"email": email, "name": name}))
        .returning(json!({"id": true}))
        .execute()
        .await
        .unwrap();
    user["id"].as_i64().unwrap()
}

pub async fn insert_post(db: &Db, author_id: i64, title: &str) -> i64 {
    let post = db
        .insert("posts")
        .values(json!({"authorId": author_id, "title": title}))
        .returning(json!({"id": true}))
        .execute()
        .await
        .unwrap();
    post["id"].as_i64().unwrap()
}

pub async fn count(db: &Db, table: &str) -> usize {
    db.find_all(table).execute().await.unwrap().len()
}

pub fn ids(rows: &[Value]) -> Vec<i64> {
    let mut ids: Vec<i64> = rows.iter().filter_map(|row| row["id"].as_i64()).collect();
    ids.sort_unstable();
    ids
}
