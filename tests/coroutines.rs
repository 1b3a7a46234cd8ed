//! Eager and lazy loads interleaved on one may worker.

use belongs_to_dynamic::test_helpers::MockExecutor;
use belongs_to_dynamic::{
    load_dynamic, BelongsTo, BelongsToDynamic, LazyLoader, LifeError, LifeExecutor, ModelTrait, Record,
    SelectQuery,
};
use sea_query::{Value, Values};
use std::sync::Arc;

/// Yields to the scheduler before every query, like a real driver waiting on I/O
struct YieldingExecutor(Arc<MockExecutor>);

impl LifeExecutor for YieldingExecutor {
    fn query_all(&self, query: &str, values: &Values) -> Result<Vec<Record>, LifeError> {
        may::coroutine::yield_now();
        self.0.query_all(query, values)
    }
}

fn relation() -> BelongsToDynamic {
    BelongsToDynamic::new(
        BelongsTo::new(SelectQuery::new("authors"), "author_id", "id", "author"),
        SelectQuery::new("post_authors"),
        "author_id",
        "post_id",
    )
}

#[test]
fn eager_load_does_not_disable_lookup_of_concurrent_lazy_load() {
    may::config().set_workers(1).set_stack_size(0x10000);

    let batch_db = Arc::new(MockExecutor::new());
    batch_db.push_rows(vec![Record::new().with_attribute("post_id", 1)]);

    let single_db = Arc::new(MockExecutor::new());
    single_db.push_rows(vec![Record::new().with_attribute("author_id", 4)]);
    single_db.push_rows(vec![Record::new().with_attribute("id", 4).with_attribute("name", "ann")]);

    let batch = {
        let executor = YieldingExecutor(Arc::clone(&batch_db));
        may::go!(move || {
            let mut posts = vec![Record::new().with_attribute("author_id", 1)];
            load_dynamic(&mut posts, &executor, relation).map(|()| posts)
        })
    };
    let single = {
        let executor = YieldingExecutor(Arc::clone(&single_db));
        may::go!(move || {
            let mut post = Record::new().with_attribute("id", 9);
            LazyLoader::new(&executor)
                .load(&mut post, &relation())
                .map(|author| (post, author))
        })
    };

    let posts = batch.join().unwrap().unwrap();
    let (post, author) = single.join().unwrap().unwrap();

    assert_eq!(batch_db.query_count(), 1);
    assert!(posts[0].get_relation("author").is_some());

    assert_eq!(single_db.query_count(), 2);
    assert_eq!(post.get_attribute("author_id"), Some(Value::Int(Some(4))));
    assert_eq!(author.and_then(|a| a.get_attribute("name")), Some(Value::from("ann")));
}
