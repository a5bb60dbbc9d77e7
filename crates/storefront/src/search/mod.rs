//! Full-text product search using Tantivy.
//!
//! The index lives in memory and is built from the database by a background
//! task (see [`start_indexing`]). The app starts with no index; searches
//! return empty pages until the first build finishes. Each rebuild swaps the
//! new index in atomically.

mod indexer;

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde::Serialize;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, STORED, Schema, TextFieldIndexing, TextOptions,
    Value,
};
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::instrument;

use pulse_threads_core::{ProductId, SalePricing};

use crate::models::{PageRequest, Paginated, Product};

pub use indexer::start_indexing;

/// Search results shown per page.
pub const RESULTS_PER_PAGE: u32 = 10;

const TOKENIZER: &str = "en_stem";

/// A product matching a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub current_price: Decimal,
    pub score: f32,
}

/// Schema field handles for the search index.
#[derive(Clone)]
pub struct SearchFields {
    // Stored fields (returned in results)
    pub product_id: Field,
    pub name: Field,
    pub slug: Field,
    pub description: Field,
    pub image_url: Field,
    pub price: Field,
    pub sale_price: Field,
    // Indexed only
    pub name_text: Field,
    pub description_text: Field,
    pub tags_text: Field,
}

/// Inner index state (once built).
struct ReadyIndex {
    reader: IndexReader,
    fields: SearchFields,
}

/// The shared search index handle.
#[derive(Clone)]
pub struct SearchIndex {
    inner: Arc<RwLock<Option<ReadyIndex>>>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    /// Create a new empty search index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Check if an index has been built.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Install a built index, replacing any previous one.
    pub(crate) fn set_ready(&self, index: &Index, fields: SearchFields) -> Result<(), SearchError> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        *self
            .inner
            .write()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))? =
            Some(ReadyIndex { reader, fields });

        Ok(())
    }

    /// Build the schema for the search index.
    pub(crate) fn build_schema() -> (Schema, SearchFields) {
        let mut schema_builder = Schema::builder();

        let product_id = schema_builder.add_u64_field(
            "product_id",
            NumericOptions::default().set_stored().set_indexed(),
        );
        let name = schema_builder.add_text_field("name", STORED);
        let slug = schema_builder.add_text_field("slug", STORED);
        let description = schema_builder.add_text_field("description", STORED);
        let image_url = schema_builder.add_text_field("image_url", STORED);
        // Decimal strings, so prices survive the round trip exactly
        let price = schema_builder.add_text_field("price", STORED);
        let sale_price = schema_builder.add_text_field("sale_price", STORED);

        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let text_options = TextOptions::default().set_indexing_options(text_indexing);

        let name_text = schema_builder.add_text_field("name_text", text_options.clone());
        let description_text =
            schema_builder.add_text_field("description_text", text_options.clone());
        let tags_text = schema_builder.add_text_field("tags_text", text_options);

        let fields = SearchFields {
            product_id,
            name,
            slug,
            description,
            image_url,
            price,
            sale_price,
            name_text,
            description_text,
            tags_text,
        };
        (schema_builder.build(), fields)
    }

    /// Build an in-memory index over `products`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Build` if the writer cannot be created or committed.
    pub fn build(products: &[Product]) -> Result<(Index, SearchFields), SearchError> {
        let (schema, fields) = Self::build_schema();
        let index = Index::create_in_ram(schema);

        index.tokenizers().register(
            TOKENIZER,
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(40))
                .filter(LowerCaser)
                .filter(Stemmer::new(Language::English))
                .build(),
        );

        let mut writer = index
            .writer::<TantivyDocument>(50_000_000)
            .map_err(|e| SearchError::Build(format!("Failed to create writer: {e}")))?;

        for product in products {
            let description = product.description.clone().unwrap_or_default();
            let mut tags = vec![product.sku.clone()];
            tags.extend(product.category.clone());
            tags.extend(product.clothing_category.map(|c| c.as_str().replace('_', " ")));
            tags.extend(product.color_variants.iter().cloned());

            let doc = tantivy::doc!(
                fields.product_id => u64::try_from(product.id.as_i32()).unwrap_or_default(),
                fields.name => product.name.clone(),
                fields.slug => product.slug.clone(),
                fields.description => description.clone(),
                fields.image_url => product.image_url.clone().unwrap_or_default(),
                fields.price => product.price.to_string(),
                fields.sale_price => product.sale_price.map(|p| p.to_string()).unwrap_or_default(),
                fields.name_text => product.name.clone(),
                fields.description_text => description,
                fields.tags_text => tags.join(" ")
            );
            writer
                .add_document(doc)
                .map_err(|e| SearchError::Build(format!("Failed to add product {}: {e}", product.id)))?;
        }

        writer
            .commit()
            .map_err(|e| SearchError::Build(format!("Failed to commit index: {e}")))?;
        Ok((index, fields))
    }

    /// Search product names, descriptions, and tags.
    ///
    /// Short terms match as prefixes; longer ones match exactly or within one
    /// edit. Returns an empty page if the index isn't built yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the index lock is poisoned or the search fails.
    #[instrument(skip(self))]
    // The read guard must outlive `ready`, which borrows from it.
    #[allow(clippy::significant_drop_tightening)]
    pub fn search(
        &self,
        query_str: &str,
        page: PageRequest,
    ) -> Result<Paginated<SearchHit>, SearchError> {
        let query_str = query_str.trim().to_lowercase();

        let guard = self
            .inner
            .read()
            .map_err(|_| SearchError::Index("Lock poisoned".to_string()))?;

        let Some(ready) = guard.as_ref() else {
            return Ok(Paginated::new(Vec::new(), page, 0));
        };
        if query_str.is_empty() {
            return Ok(Paginated::new(Vec::new(), page, 0));
        }

        let query = build_query(&query_str, &ready.fields);
        let searcher = ready.reader.searcher();
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(1).max(1);

        let (total, top_docs) = searcher
            .search(
                &query,
                &(Count, TopDocs::with_limit(limit).and_offset(offset)),
            )
            .map_err(|e| SearchError::Query(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc = searcher
                .doc::<TantivyDocument>(address)
                .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))?;
            hits.push(doc_to_hit(&ready.fields, &doc, score)?);
        }

        Ok(Paginated::new(
            hits,
            page,
            i64::try_from(total).unwrap_or(i64::MAX),
        ))
    }

    /// Number of indexed products, or 0 if not ready.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|r| r.reader.searcher().num_docs()))
            .unwrap_or(0)
    }
}

fn build_query(query_str: &str, fields: &SearchFields) -> BooleanQuery {
    let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for term in query_str.split_whitespace() {
        if term.chars().count() < 3 {
            // Prefix match, e.g. "dr" finds "dress"
            let prefix_pattern = format!("{}.*", regex::escape(term));
            for field in [fields.name_text, fields.tags_text] {
                if let Ok(regex_query) = RegexQuery::from_pattern(&prefix_pattern, field) {
                    subqueries.push((Occur::Should, Box::new(regex_query)));
                }
            }
        } else {
            let name_term = Term::from_field_text(fields.name_text, term);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(name_term.clone(), IndexRecordOption::Basic)),
            ));
            subqueries.push((
                Occur::Should,
                Box::new(FuzzyTermQuery::new(name_term, 1, true)),
            ));

            let desc_term = Term::from_field_text(fields.description_text, term);
            subqueries.push((
                Occur::Should,
                Box::new(FuzzyTermQuery::new(desc_term, 1, true)),
            ));

            let tags_term = Term::from_field_text(fields.tags_text, term);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(tags_term, IndexRecordOption::Basic)),
            ));
        }
    }

    BooleanQuery::new(subqueries)
}

fn doc_to_hit(
    fields: &SearchFields,
    doc: &TantivyDocument,
    score: f32,
) -> Result<SearchHit, SearchError> {
    let get_text = |field: Field| -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    let get_decimal = |field: Field| -> Result<Option<Decimal>, SearchError> {
        let raw = get_text(field);
        if raw.is_empty() {
            return Ok(None);
        }
        Decimal::from_str(&raw)
            .map(Some)
            .map_err(|e| SearchError::Query(format!("Invalid stored price {raw}: {e}")))
    };

    let id = doc
        .get_first(fields.product_id)
        .and_then(|v| v.as_u64())
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| SearchError::Query("Missing product id".to_string()))?;
    let price = get_decimal(fields.price)?
        .ok_or_else(|| SearchError::Query("Missing price".to_string()))?;
    let sale_price = get_decimal(fields.sale_price)?;
    let image_url = get_text(fields.image_url);

    Ok(SearchHit {
        id: ProductId::new(id),
        name: get_text(fields.name),
        slug: get_text(fields.slug),
        description: get_text(fields.description),
        image_url: (!image_url.is_empty()).then_some(image_url),
        current_price: SalePricing::new(price, sale_price).current(),
        price,
        sale_price,
        score,
    })
}

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Build error: {0}")]
    Build(String),
}
