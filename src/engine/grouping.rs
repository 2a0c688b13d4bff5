use std::collections::BTreeMap;

use crate::model::Record;

pub fn partition_by_lang_pair(records: &[Record]) -> BTreeMap<String, Vec<&Record>> {
    let mut pairs: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    for record in records {
        pairs.entry(record.lang_pair()).or_default().push(record);
    }
    pairs
}

pub fn group_by_document<'a>(records: &[&'a Record]) -> BTreeMap<&'a str, Vec<&'a Record>> {
    let mut documents: BTreeMap<&'a str, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        documents
            .entry(record.doc_id.as_str())
            .or_default()
            .push(*record);
    }
    documents
}
