use crate::category::CategoryEntry;
use crate::store::{RemoteStore, StoreResult};

/// All categories, ordered by name as the store returns them.
pub async fn get_categories(store: &dyn RemoteStore) -> StoreResult<Vec<CategoryEntry>> {
    let rows = store.select_categories().await?;
    Ok(rows.into_iter().filter_map(|row| row.into_entry()).collect())
}
