mod support;

use pretty_assertions::assert_eq;
use schema_graph::{
    CatalogError, CatalogReader, Dialect, ForeignKeyFilter, KeyRole, Predicate, ReaderConfig,
    TableFilter,
};

use support::{MemoryCatalog, Unreachable, blog_catalog, reader};

#[tokio::test]
async fn housekeeping_tables_are_never_listed() {
    let (_, reader) = reader(blog_catalog());

    let names: Vec<String> = reader
        .list_tables(&TableFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

    assert_eq!(names, vec!["post_tag", "posts", "tags", "users"]);
}

#[tokio::test]
async fn deny_listed_table_is_not_found_by_name() {
    let (_, reader) = reader(blog_catalog());

    let err = reader.table("migrations").await.unwrap_err();

    assert!(matches!(err, CatalogError::NotFound { kind: "table", .. }));
}

#[tokio::test]
async fn extra_ignored_tables_are_skipped() {
    let catalog = std::sync::Arc::new(blog_catalog());
    let config = ReaderConfig::new(Dialect::MySql, "blog").ignore(["tags"]);
    let reader = CatalogReader::new(catalog, config);

    let tables = reader.list_tables(&TableFilter::default()).await.unwrap();

    assert!(tables.iter().all(|t| t.name != "tags"));
    assert_eq!(tables.len(), 3);
}

#[tokio::test]
async fn other_schemas_are_out_of_scope() {
    let catalog = blog_catalog().table_in("analytics", "events", "Tracked events");
    let (catalog, reader) = reader(catalog);

    let tables = reader.list_tables(&TableFilter::default()).await.unwrap();

    assert!(tables.iter().all(|t| t.name != "events"));
    let scoped = catalog.queries().into_iter().all(|q| {
        q.predicates
            .contains(&Predicate::Eq("table_catalog", "def".to_string()))
            && q.predicates
                .contains(&Predicate::Eq("table_schema", "blog".to_string()))
    });
    assert!(scoped);
}

#[tokio::test]
async fn upper_case_fields_are_normalized() {
    let (_, reader) = reader(blog_catalog());

    let users = reader.table("users").await.unwrap();

    assert_eq!(users.catalog_name, "def");
    assert_eq!(users.schema_name, "blog");
    assert_eq!(users.comment, "App users");
    assert_eq!(users.engine.as_deref(), Some("InnoDB"));
    assert_eq!(users.row_count, Some(42));
    assert_eq!(users.data_length, None);
}

#[tokio::test]
async fn commented_only_filter() {
    let (_, reader) = reader(blog_catalog());

    let filter = TableFilter {
        names: None,
        commented_only: true,
    };
    let names: Vec<String> = reader
        .list_tables(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

    assert_eq!(names, vec!["posts", "tags", "users"]);
}

#[tokio::test]
async fn columns_come_in_ordinal_order() {
    let catalog = MemoryCatalog::mysql("blog")
        .table("posts", "Blog posts")
        .column("posts", "title", 3, true, "")
        .column("posts", "id", 1, false, "PRI")
        .column("posts", "user_id", 2, false, "MUL");
    let (_, reader) = reader(catalog);

    let columns = reader.list_columns("posts").await.unwrap();

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "user_id", "title"]);
    assert_eq!(columns[0].key, KeyRole::Primary);
    assert_eq!(columns[1].key, KeyRole::Foreign);
    assert!(columns[2].nullable);
}

#[tokio::test]
async fn foreign_keys_skip_rows_without_references() {
    let catalog = blog_catalog().key_usage("posts_slug_unique", "posts", "title", None);
    let (_, reader) = reader(catalog);

    let edges = reader.foreign_keys_of("posts").await.unwrap();

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].constraint_name, "posts_user_id_foreign");
    assert_eq!(edges[0].target(), Some(("users", "id")));
}

#[tokio::test]
async fn foreign_keys_by_referenced_table() {
    let (_, reader) = reader(blog_catalog());

    let edges = reader
        .list_foreign_keys(&ForeignKeyFilter::to_table("posts"))
        .await
        .unwrap();

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].table_name, "post_tag");
    assert_eq!(edges[0].column_name, "post_id");
}

#[tokio::test]
async fn postgres_identity_uses_public_schema() {
    let catalog = MemoryCatalog::new(Dialect::Postgres, "blog")
        .table("users", "App users")
        .column("users", "id", 1, false, "PRI");
    let (catalog, reader) = reader(catalog);

    let users = reader.table("users").await.unwrap();
    let columns = reader.list_columns("users").await.unwrap();

    assert_eq!(users.catalog_name, "blog");
    assert_eq!(users.schema_name, "public");
    assert_eq!(columns.len(), 1);
    assert!(catalog.queries().iter().all(|q| q
        .predicates
        .contains(&Predicate::Eq("table_schema", "public".to_string()))));
}

#[tokio::test]
async fn never_analyzed_postgres_table_has_no_row_estimate() {
    let catalog = MemoryCatalog::new(Dialect::Postgres, "blog")
        .table("users", "App users")
        .table("posts", "Blog posts")
        .column("posts", "id", 1, false, "PRI")
        .column("posts", "user_id", 2, false, "MUL")
        .foreign_key("posts_user_id_foreign", "posts", "user_id", "users", "id")
        .table_field("users", "table_rows", Some("-1"))
        .table_field("users", "engine", None)
        .table_field("posts", "table_rows", Some("-1"))
        .table_field("posts", "engine", None);
    let (_, reader) = reader(catalog);

    let tables = reader.list_tables(&TableFilter::default()).await.unwrap();
    let snapshot = reader.snapshot_for("users").await.unwrap();

    assert_eq!(tables.len(), 2);
    assert!(tables.iter().all(|t| t.row_count.is_none() && t.engine.is_none()));
    assert_eq!(snapshot.edges.len(), 1);
}

#[tokio::test]
async fn unreachable_catalog_propagates_connection_error() {
    let reader = CatalogReader::new(Unreachable, ReaderConfig::new(Dialect::MySql, "blog"));

    let err = reader
        .list_tables(&TableFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Connection(_)));
}
