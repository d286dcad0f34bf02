//! One page of results plus its pagination metadata.

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::query::PageWindow;

/// A page of rows and the totals that describe it.
///
/// Serializes with the field names existing clients read: `page`, `psize`,
/// then either `totalcount` + `pagecount` (count mode) or `hasnext` as `0`/`1`
/// (peek mode), then `Items` and, when set, `Context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
   /// 1-based page index. Clamped down to `pagecount` in count mode.
   pub page: i64,
   /// Page size used for the fetch.
   pub psize: i64,
   #[serde(flatten)]
   pub totals: PageTotals,
   /// The rows for this page, at most `psize` of them.
   #[serde(rename = "Items")]
   pub items: Vec<T>,
   /// Caller-attached value carried with the page; never filled by the fetch.
   #[serde(rename = "Context", skip_serializing_if = "Option::is_none")]
   pub context: Option<JsonValue>,
}

/// Which of the two pagination modes produced a page.
///
/// Exactly one side is populated per fetch; the accessors on [`Page`] report
/// zero for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageTotals {
   /// A count statement ran.
   Counted { totalcount: i64, pagecount: i64 },
   /// One extra row was fetched instead of counting.
   Peeked {
      #[serde(serialize_with = "serialize_flag")]
      hasnext: bool,
   },
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
   serializer.serialize_u8(u8::from(*flag))
}

impl<T> Page<T> {
   /// Build a count-mode page.
   ///
   /// `pagecount = ceil(total_count / psize)`. A requested page past the last
   /// one is rewritten to `pagecount` (which is 0 for an empty result); the
   /// rows are whatever the fetch returned.
   pub fn counted(window: &PageWindow, items: Vec<T>, total_count: i64) -> Self {
      let total_count = total_count.max(0);
      let page_count = total_count / window.psize + i64::from(total_count % window.psize != 0);
      let page = window.page.min(page_count);

      Self {
         page,
         psize: window.psize,
         totals: PageTotals::Counted {
            totalcount: total_count,
            pagecount: page_count,
         },
         items,
         context: None,
      }
   }

   /// Build a peek-mode page from rows fetched with one extra row.
   ///
   /// `hasnext` is set when more than `psize` rows came back; the extra row is
   /// dropped.
   pub fn peeked(window: &PageWindow, mut items: Vec<T>) -> Self {
      let limit = window.psize_len();
      let has_next = items.len() > limit;
      items.truncate(limit);

      Self {
         page: window.page,
         psize: window.psize,
         totals: PageTotals::Peeked { hasnext: has_next },
         items,
         context: None,
      }
   }

   /// Total matching rows; 0 for a peek-mode page.
   pub fn total_count(&self) -> i64 {
      match self.totals {
         PageTotals::Counted { totalcount, .. } => totalcount,
         PageTotals::Peeked { .. } => 0,
      }
   }

   /// Number of pages; 0 for a peek-mode page.
   pub fn page_count(&self) -> i64 {
      match self.totals {
         PageTotals::Counted { pagecount, .. } => pagecount,
         PageTotals::Peeked { .. } => 0,
      }
   }

   /// Whether a further page exists; always false for a count-mode page.
   pub fn has_next(&self) -> bool {
      matches!(self.totals, PageTotals::Peeked { hasnext: true })
   }

   pub fn is_peeked(&self) -> bool {
      matches!(self.totals, PageTotals::Peeked { .. })
   }

   pub fn with_context(mut self, context: JsonValue) -> Self {
      self.context = Some(context);
      self
   }

   /// Convert the rows, keeping the metadata.
   pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
      Page {
         page: self.page,
         psize: self.psize,
         totals: self.totals,
         items: self.items.into_iter().map(f).collect(),
         context: self.context,
      }
   }
}
