/// Query entry points shared by [`Database`](crate::Database) and
/// [`Transaction`](crate::Transaction). Expects `self.session: S` and
/// `self.schema: Arc<Schema>`.
#[doc(hidden)]
macro_rules! query_methods_impl {
    () => {
        /// Selects at most one row of `table`.
        pub fn find_one(
            &self,
            table: impl Into<String>,
        ) -> trellis_sqlite::SelectQuery<'_, S, trellis_sqlite::One> {
            trellis_sqlite::SelectQuery::new(&self.session, self.schema.clone(), table)
        }

        /// Selects every matching row of `table`.
        pub fn find_all(
            &self,
            table: impl Into<String>,
        ) -> trellis_sqlite::SelectQuery<'_, S, trellis_sqlite::Many> {
            trellis_sqlite::SelectQuery::new(&self.session, self.schema.clone(), table)
        }

        pub fn insert(&self, table: impl Into<String>) -> trellis_sqlite::InsertQuery<'_, S> {
            trellis_sqlite::InsertQuery::new(&self.session, self.schema.clone(), table)
        }

        pub fn update(&self, table: impl Into<String>) -> trellis_sqlite::UpdateQuery<'_, S> {
            trellis_sqlite::UpdateQuery::new(&self.session, self.schema.clone(), table)
        }

        pub fn delete(&self, table: impl Into<String>) -> trellis_sqlite::DeleteQuery<'_, S> {
            trellis_sqlite::DeleteQuery::new(&self.session, self.schema.clone(), table)
        }

        /// Arbitrary SQL with positional parameters.
        pub fn raw(
            &self,
            sql: impl Into<String>,
            params: Vec<trellis_core::SQLiteValue>,
        ) -> trellis_core::Prepared<'_, S> {
            self.session.prepare(sql, params)
        }

        #[inline]
        pub fn session(&self) -> &S {
            &self.session
        }

        #[inline]
        pub fn schema(&self) -> &std::sync::Arc<trellis_sqlite::Schema> {
            &self.schema
        }
    };
}
