//! String codec for stored link entries.
//!
//! Each entry in an adjacency list is one link, encoded as:
//!
//! ```text
//! <uuid> US <container id> US <entity id> US <direction code>
//! ```
//!
//! where `US` is the ASCII unit separator (`0x1F`). No field can contain it,
//! so no escaping is needed.

use tracing::debug;

use crate::direction::Direction;
use crate::entity::EntityRef;
use crate::error::{CodecError, LinkResult};
use crate::link::{Link, LinkId};
use crate::storage::EntityDirectory;

/// Field separator inside an encoded entry.
pub const FIELD_SEPARATOR: char = '\u{1f}';

const FIELD_COUNT: usize = 4;

/// Encodes a link into its stored form.
#[must_use]
pub fn encode(link: &Link) -> String {
    format!(
        "{id}{sep}{container}{sep}{entity}{sep}{code}",
        id = link.id,
        container = link.target.container_id,
        entity = link.target.entity_id,
        code = link.direction.code(),
        sep = FIELD_SEPARATOR,
    )
}

/// Parses a stored entry without consulting the entity directory.
///
/// # Errors
/// Returns [`CodecError::CorruptEntry`] when the entry is malformed.
pub fn parse(entry: &str) -> Result<Link, CodecError> {
    let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(CodecError::corrupt(
            entry,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let id = fields[0]
        .parse::<LinkId>()
        .map_err(|e| CodecError::corrupt(entry, format!("link id: {e}")))?;
    let container_id = fields[1]
        .parse::<u32>()
        .map_err(|e| CodecError::corrupt(entry, format!("container id: {e}")))?;
    let entity_id = fields[2]
        .parse::<u64>()
        .map_err(|e| CodecError::corrupt(entry, format!("entity id: {e}")))?;

    let mut code = fields[3].chars();
    let direction = match (code.next(), code.next()) {
        (Some(c), None) => Direction::from_code(c),
        _ => None,
    }
    .ok_or_else(|| CodecError::corrupt(entry, format!("direction code {:?}", fields[3])))?;

    Ok(Link::with_id(
        id,
        EntityRef::new(container_id, entity_id),
        direction,
    ))
}

/// Decodes a stored entry and checks that its target still exists.
///
/// Returns `Ok(None)` when the target is gone; the caller drops the entry
/// instead of failing the read.
///
/// # Errors
/// - [`CodecError::CorruptEntry`] (as `LinkError::Codec`) for a malformed entry
/// - `LinkError::Storage` if the directory itself fails
pub fn decode(entry: &str, directory: &dyn EntityDirectory) -> LinkResult<Option<Link>> {
    let link = parse(entry)?;
    if directory.exists(&link.target)? {
        Ok(Some(link))
    } else {
        debug!(target_entity = %link.target, link_id = %link.id, "links.codec.dead_target");
        Ok(None)
    }
}
