use async_trait::async_trait;

/// Borrowed view of a single queue record.
///
/// The borrow is scoped to one poll iteration; a handler that needs any of
/// this data past its `handle` call must copy it out.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub topic: &'a str,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<&'a [u8]>,
    pub payload: &'a [u8],
}

/// Handles every record of one topic.
///
/// `handle` returns nothing: handlers own their failure reporting, so a
/// record that cannot be processed never holds back the rest of its batch
/// or the batch's commit.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, record: Record<'_>);
}
