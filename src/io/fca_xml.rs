//! FCA transaction report XML source
//!
//! Reads the regulatory feed (namespace [`FCA_NAMESPACE`]) into the flat
//! column layout of [`fca_columns`], one record per `Tx` element. Transaction
//! wrappers nest a second `Tx` holding the trade details; those inner elements
//! carry no `TxId` and are dropped together with any other blank-key record.

use roxmltree::{Document, Node};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::traits::*;
use crate::types::*;

/// Namespace of every element in the FCA report
pub const FCA_NAMESPACE: &str = "http://mdp.fca.org.uk/gb_extra";

/// How one column is pulled out of a `Tx` element
#[derive(Debug, Clone, Copy)]
enum Extract {
    /// Text of the first element at the path
    Text(&'static [&'static str]),
    /// Attribute of the first element at the path
    Attribute(&'static [&'static str], &'static str),
}

use Extract::{Attribute, Text};

const AMOUNT: &[&str] = &["Tx", "Pric", "Pric", "MntryVal", "Amt"];
const NOMINAL_VALUE: &[&str] = &["Tx", "Qty", "NmnlVal"];

/// Column layout of the extracted FCA record set, in output order
const FCA_FIELDS: [(&str, Extract); 30] = [
    ("TxId", Text(&["TxId"])),
    ("ExctgPty", Text(&["ExctgPty"])),
    ("InvstmtPtyInd", Text(&["InvstmtPtyInd"])),
    ("SubmitgPty", Text(&["SubmitgPty"])),
    ("LEI", Text(&["Buyr", "AcctOwnr", "Id", "LEI"])),
    ("CtryOfBrnch", Text(&["Buyr", "AcctOwnr", "CtryOfBrnch"])),
    ("LEI2", Text(&["Buyr", "DcsnMakr", "LEI"])),
    ("LEI3", Text(&["Sellr", "AcctOwnr", "Id", "LEI"])),
    ("TrnsmssnInd", Text(&["OrdrTrnsmssn", "TrnsmssnInd"])),
    ("TradDt", Text(&["Tx", "TradDt"])),
    ("TradgCpcty", Text(&["Tx", "TradgCpcty"])),
    ("QtyUnit", Text(&["Tx", "Qty", "Unit"])),
    ("Amt", Text(AMOUNT)),
    ("Ccy", Attribute(AMOUNT, "Ccy")),
    ("NmnlVal", Text(NOMINAL_VALUE)),
    ("NmnlValCcy", Attribute(NOMINAL_VALUE, "Ccy")),
    ("Pctg", Text(&["Tx", "Pric", "Pric", "Pctg"])),
    ("NetAmt", Text(&["Tx", "NetAmt"])),
    ("TradVn", Text(&["Tx", "TradVn"])),
    ("FinInstrmId", Text(&["FinInstrm", "Id"])),
    (
        "InvstmtDcsnPrsnCtryOfBrnch",
        Text(&["InvstmtDcsnPrsn", "Prsn", "CtryOfBrnch"]),
    ),
    (
        "InvstmtDcsnPrsnId",
        Text(&["InvstmtDcsnPrsn", "Prsn", "Othr", "Id"]),
    ),
    (
        "InvstmtDcsnPrsnCd",
        Text(&["InvstmtDcsnPrsn", "Prsn", "Othr", "SchmeNm", "Cd"]),
    ),
    (
        "InvstmtDcsnPrsnPrtry",
        Text(&["InvstmtDcsnPrsn", "Prsn", "Othr", "SchmeNm", "Prtry"]),
    ),
    (
        "ExctgPrsnCtryOfBrnch",
        Text(&["ExctgPrsn", "Prsn", "CtryOfBrnch"]),
    ),
    ("ExctgPrsnId", Text(&["ExctgPrsn", "Prsn", "Othr", "Id"])),
    (
        "ExctgPrsnCd",
        Text(&["ExctgPrsn", "Prsn", "Othr", "SchmeNm", "Cd"]),
    ),
    (
        "SctiesFincgTxInd",
        Text(&["AddtlAttrbts", "SctiesFincgTxInd"]),
    ),
    ("Sts", Text(&["Feedback", "Sts"])),
    ("SubmDt", Text(&["SubmDt"])),
];

/// Column names of the extracted FCA record set
pub fn fca_columns() -> impl Iterator<Item = &'static str> {
    FCA_FIELDS.iter().map(|(column, _)| *column)
}

fn is_fca_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(FCA_NAMESPACE)
}

/// First element, in document order, reached by `steps` from `node`'s children
fn follow<'a, 'input>(node: Node<'a, 'input>, steps: &[&str]) -> Option<Node<'a, 'input>> {
    let Some((first, rest)) = steps.split_first() else {
        return Some(node);
    };
    node.children()
        .filter(|child| is_fca_element(child, first))
        .find_map(|child| follow(child, rest))
}

/// First element matching `path` anywhere below `tx`
///
/// The first step may sit at any depth; the remaining steps are direct
/// children.
fn find_below<'a, 'input>(tx: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    let (first, rest) = path.split_first()?;
    tx.descendants()
        .skip(1)
        .filter(|node| is_fca_element(node, first))
        .find_map(|node| follow(node, rest))
}

fn extract(tx: Node<'_, '_>, how: Extract) -> Value {
    let text = match how {
        Text(path) => find_below(tx, path).and_then(|node| node.text()),
        Attribute(path, name) => find_below(tx, path).and_then(|node| node.attribute(name)),
    };
    Value::text(text.unwrap_or_default())
}

/// Parse an FCA report document into records, dropping blank-key `Tx` elements
pub fn parse_fca_xml(text: &str) -> ReconResult<RecordSet> {
    let document = Document::parse(text)?;
    let mut set = RecordSet::new(fca_columns());

    let mut dropped = 0;
    for tx in document
        .descendants()
        .filter(|node| is_fca_element(node, "Tx"))
    {
        let values: Vec<Value> = FCA_FIELDS.iter().map(|(_, how)| extract(tx, *how)).collect();
        if values[0].is_blank() {
            dropped += 1;
            continue;
        }
        set.push_row(values)?;
    }

    debug!(rows = set.len(), dropped, "parsed fca transactions");
    Ok(set)
}

/// FCA transaction report read from an XML file
#[derive(Debug, Clone)]
pub struct FcaXmlSource {
    path: PathBuf,
}

impl FcaXmlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FcaXmlSource {
    fn side(&self) -> Side {
        Side::Fca
    }

    fn load(&self) -> ReconResult<RecordSet> {
        let text = fs::read_to_string(&self.path)?;
        let records = parse_fca_xml(&text)?;
        info!(path = %self.path.display(), rows = records.len(), "parsed xml");
        Ok(records)
    }
}
