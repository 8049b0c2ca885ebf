use anyhow::{Result, anyhow, bail};
use hillfoots_core::Collection;
use hillfoots_core::store::Store;
use owo_colors::OwoColorize;

pub fn run(collection: &str, id: &str) -> Result<()> {
    let collection: Collection = collection.parse().map_err(|e: String| anyhow!(e))?;
    let (_, mut store) = super::open()?;

    remove_record(&mut store, collection, id)?;
    println!("Removed {} from {}", id.green(), collection);
    Ok(())
}

pub fn unsubscribe(email: &str) -> Result<()> {
    let (_, mut store) = super::open()?;

    let removed = store.unsubscribe(email)?;
    if removed == 0 {
        println!("{}", format!("{} is not subscribed", email.trim()).dimmed());
    } else {
        println!("Unsubscribed {}", email.trim().green());
    }
    Ok(())
}

/// Remove one record from the local copy. Pushing the collection afterwards
/// is up to the caller.
fn remove_record(store: &mut impl Store, collection: Collection, id: &str) -> Result<()> {
    if collection == Collection::Mission {
        bail!("The mission statement can be replaced but not removed");
    }

    if !store.remove(collection, id)? {
        bail!("No record '{}' in {}", id, collection);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hillfoots_core::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_remove_record() {
        let mut store = MemoryStore::new();
        store.put(Collection::Knowledge, json!({"id": "k1", "title": "Parking"})).unwrap();

        remove_record(&mut store, Collection::Knowledge, "k1").unwrap();
        assert!(store.get(Collection::Knowledge).unwrap().is_empty());

        let err = remove_record(&mut store, Collection::Knowledge, "k1").unwrap_err();
        assert_eq!(err.to_string(), "No record 'k1' in knowledge");
    }

    #[test]
    fn test_mission_cannot_be_removed() {
        let mut store = MemoryStore::new();
        store.put(Collection::Mission, json!({"id": "m", "text": "One parish"})).unwrap();

        assert!(remove_record(&mut store, Collection::Mission, "m").is_err());
        assert_eq!(store.get(Collection::Mission).unwrap().len(), 1);
    }
}
