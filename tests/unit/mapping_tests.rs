/*!
 * Tests for the scene/shot mapping table
 */

use anyhow::Result;
use platekeeper::errors::MappingError;
use platekeeper::mapping::MappingTable;
use crate::common;

/// Exact compound key match returns label and type string
#[test]
fn test_find_withExactKey_shouldReturnRecord() -> Result<()> {
    let table = MappingTable::parse("048/0140,sc48_sh0140,plate_bg_v001\n048/01400,sc48_sh1400,comp\n");

    let record = table.find("048", "048/0140")?;

    assert_eq!(record.label, "sc48_sh0140");
    assert_eq!(record.type_string, "plate_bg_v001");
    assert_eq!(record.shot_code(), "sh0140");
    Ok(())
}

/// Substring candidates that are not exact matches are rejected
#[test]
fn test_find_withOnlyPartialMatch_shouldFail() {
    let table = MappingTable::parse("048/01400,sc48_sh1400,comp\n");

    let err = table.find("048", "048/0140").unwrap_err();
    assert!(matches!(err, MappingError::NoMatch { .. }));
}

/// Type strings of one to three tokens are accepted, with surrounding underscores trimmed
#[test]
fn test_typeTokens_shouldSplitPositionally() -> Result<()> {
    let table = MappingTable::parse("a/1,l1,_comp_\na/2,l2,plate_v002\na/3,l3,plate_bg_v001\n");

    let one = table.find("a", "a/1")?.type_tokens()?;
    assert_eq!(one.variant, "comp");
    assert_eq!(one.product_type, None);

    let two = table.find("a", "a/2")?.type_tokens()?;
    assert_eq!(two.version_marker.as_deref(), Some("v002"));
    assert_eq!(two.product_type, None);

    let three = table.find("a", "a/3")?.type_tokens()?;
    assert_eq!(three.product_type.as_deref(), Some("bg"));
    Ok(())
}

/// Quoted cells, blank rows and short rows
#[test]
fn test_load_withQuotedAndShortRows_shouldKeepValidRows() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let csv = common::create_mapping(
        temp_dir.path(),
        &["\"048/0140\", \"sc48_sh0140\" ,plate_bg_v001", "", "048/0150,only_label"],
    )?;

    let table = MappingTable::load(&csv)?;

    assert_eq!(table.len(), 1);
    assert_eq!(table.find("048", "048/0140")?.label, "sc48_sh0140");
    Ok(())
}

/// A missing file is a mapping error
#[test]
fn test_load_withMissingFile_shouldFail() {
    let err = MappingTable::load("/no/such/shots.csv").unwrap_err();
    assert!(matches!(err, MappingError::Unreadable { .. }));
}
