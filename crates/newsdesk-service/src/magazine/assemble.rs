//! PDF assembly: signature checks and page-order-preserving merge.
//!
//! The assembler is the integrity gate of the pipeline. A zero-length or
//! non-PDF intermediate aborts the whole magazine generation; otherwise a
//! corrupted render would propagate an unusable file to readers and to the
//! flipbook converter.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use crate::errors::ApiError;

/// The 4-byte magic marker every PDF starts with.
const PDF_MAGIC: &[u8] = b"%PDF";

/// Reject empty buffers and buffers without the PDF magic marker.
pub fn check_pdf_signature(bytes: &[u8], label: &str) -> Result<(), ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Integrity(format!("{label}: empty PDF")));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ApiError::Integrity(format!(
            "{label}: missing PDF signature"
        )));
    }
    Ok(())
}

/// Number of pages in a PDF buffer.
pub fn page_count(bytes: &[u8]) -> Result<usize, ApiError> {
    let document = Document::load_mem(bytes)
        .map_err(|err| ApiError::Integrity(format!("unreadable PDF: {err}")))?;
    Ok(document.get_pages().len())
}

/// Merge PDFs into one document, preserving input order exactly.
///
/// Purely structural: pages are re-parented into one page tree, nothing is
/// re-paginated or transformed. Every input is signature-checked first.
pub fn merge_pdfs(inputs: &[Vec<u8>]) -> Result<Vec<u8>, ApiError> {
    if inputs.is_empty() {
        return Err(ApiError::Integrity("no PDFs to merge".to_string()));
    }

    for (index, bytes) in inputs.iter().enumerate() {
        check_pdf_signature(bytes, &format!("merge input #{}", index + 1))?;
    }

    // Renumbering each document above the running max id keeps object ids
    // strictly increasing across inputs, so the BTreeMap below iterates
    // pages in input order.
    let mut max_id = 1;
    let mut documents_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut documents_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, bytes) in inputs.iter().enumerate() {
        let mut doc = Document::load_mem(bytes).map_err(|err| {
            ApiError::Integrity(format!("merge input #{}: {err}", index + 1))
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let object = doc.get_object(object_id).map_err(|err| {
                ApiError::Integrity(format!("merge input #{}: {err}", index + 1))
            })?;
            documents_pages.insert(object_id, object.to_owned());
        }
        documents_objects.extend(doc.objects);
    }

    let mut document = Document::with_version("1.5");
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in documents_objects.iter() {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                catalog_object = Some((
                    catalog_object.map(|(id, _)| id).unwrap_or(*object_id),
                    object.clone(),
                ));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing) = existing.as_dict() {
                            dictionary.extend(existing);
                        }
                    }
                    pages_object = Some((
                        pages_object.map(|(id, _)| id).unwrap_or(*object_id),
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            // Pages are re-parented below; outlines are dropped.
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                document.objects.insert(*object_id, object.clone());
            }
        }
    }

    let pages_object =
        pages_object.ok_or_else(|| ApiError::Integrity("no page tree found".to_string()))?;
    let catalog_object =
        catalog_object.ok_or_else(|| ApiError::Integrity("no catalog found".to_string()))?;

    for (object_id, object) in documents_pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_object.0);
            document.objects.insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", documents_pages.len() as u32);
        dictionary.set(
            "Kids",
            documents_pages
                .keys()
                .map(|object_id| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_object.0, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_object.0);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_object.0, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_object.0);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|err| ApiError::Integrity(format!("failed to write merged PDF: {err}")))?;

    Ok(buffer)
}
