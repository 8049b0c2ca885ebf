use anyhow::Result;
use chrono::NaiveDateTime;
use futures::future::join_all;
use hillfoots_core::Collection;
use hillfoots_core::model::Record;
use hillfoots_core::normalize::Normalizer;
use hillfoots_core::store::Store;
use hillfoots_sheets::SyncApi;
use owo_colors::OwoColorize;
use serde_json::Value;

use crate::utils::tui::{endpoint_label, while_syncing};

/// Records pulled for one collection. `None` when the sheet returned no
/// rows and the local copy was left alone.
pub struct PullStats {
    pub collection: Collection,
    pub pulled: Option<usize>,
}

pub async fn run() -> Result<()> {
    let (config, mut store) = super::open()?;
    let client = super::sheets_client(&config)?;
    let now = chrono::Local::now().naive_local();

    let message = format!("Pulling from {}", endpoint_label(client.url()));
    let result = while_syncing(message, pull_all(&client, &mut store, now)).await;

    for stats in result? {
        match stats.pulled {
            Some(count) => println!("  {:<12} {} records", stats.collection.name(), count.green()),
            None => println!("  {:<12} {}", stats.collection.name(), "no rows, kept local copy".dimmed()),
        }
    }

    Ok(())
}

/// Fetch every synced collection concurrently, then normalize and store the
/// ones that returned rows.
pub async fn pull_all<A, S>(api: &A, store: &mut S, now: NaiveDateTime) -> Result<Vec<PullStats>>
where
    A: SyncApi + ?Sized,
    S: Store,
{
    let fetches = Collection::SYNCED.map(|collection| async move {
        (collection, api.fetch(collection).await)
    });
    let fetched = join_all(fetches).await;

    let normalizer = Normalizer::new(now);
    let mut stats = Vec::with_capacity(fetched.len());

    for (collection, rows) in fetched {
        let pulled = if rows.is_empty() {
            None
        } else {
            Some(apply(store, &normalizer, collection, &rows)?)
        };
        tracing::debug!(%collection, rows = rows.len(), "pulled collection");
        stats.push(PullStats { collection, pulled });
    }

    Ok(stats)
}

fn apply<S: Store>(
    store: &mut S,
    normalizer: &Normalizer,
    collection: Collection,
    rows: &[Value],
) -> Result<usize> {
    match collection {
        Collection::Events => save(store, normalizer.all(rows, Normalizer::event)),
        Collection::Groups => save(store, normalizer.all(rows, Normalizer::group)),
        Collection::Contacts => save(store, normalizer.all(rows, Normalizer::contact)),
        Collection::Subscribers => save(store, normalizer.all(rows, Normalizer::subscriber)),
        Collection::Feedback => save(store, normalizer.all(rows, Normalizer::feedback)),
        Collection::Knowledge => save(store, normalizer.all(rows, Normalizer::knowledge)),
        Collection::Requests => save(store, normalizer.all(rows, Normalizer::request)),
        Collection::Mission => match normalizer.mission(rows) {
            Some(mission) => {
                store.set_mission(&mission)?;
                Ok(1)
            }
            None => Ok(0),
        },
        Collection::Inspiration => Ok(0),
    }
}

fn save<S: Store, T: Record>(store: &mut S, records: Vec<T>) -> Result<usize> {
    store.save_all(&records)?;
    Ok(records.len())
}
