//! Byte-level SQL scanner.
//!
//! Walks a statement while tracking parenthesis depth and skipping everything a
//! keyword or placeholder search must not look inside: string literals, quoted
//! identifiers (`"…"`, `` `…` ``, `[…]`) and comments (`-- …`, `/* … */`).
//!
//! This is not a tokenizer. It is the smallest thing that lets the pagination
//! rewriter find the `FROM` that belongs to the outer SELECT, and lets the
//! repository find named placeholders and split statement batches, without
//! parsing SQL.

use std::borrow::Cow;

/// Check whether `keyword` appears as a standalone keyword at position `i`,
/// ignoring ASCII case.
///
/// "Standalone" means the character before and after the keyword (if present)
/// is not an identifier character (`[A-Za-z0-9_]`).
pub fn is_keyword_at(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
   let len = bytes.len();
   let klen = keyword.len();
   if i + klen > len {
      return false;
   }
   if !bytes[i..i + klen].eq_ignore_ascii_case(keyword) {
      return false;
   }
   let before_ok = i == 0 || !is_identifier_byte(bytes[i - 1]);
   let after_ok = i + klen >= len || !is_identifier_byte(bytes[i + klen]);

   before_ok && after_ok
}

/// `[A-Za-z0-9_]`
pub fn is_identifier_byte(b: u8) -> bool {
   b.is_ascii_alphanumeric() || b == b'_'
}

/// Advance the scanner index past a quoted literal or identifier.
///
/// `close` is the closing quote character. A doubled closing character is an
/// escape (`''`, `""`, ` `` `, `]]`). Returns the index of the closing quote, or
/// the end of input when unterminated.
fn skip_quoted(bytes: &[u8], i: usize, close: u8) -> usize {
   let len = bytes.len();
   let mut j = i + 1;
   while j < len {
      if bytes[j] == close {
         if j + 1 < len && bytes[j + 1] == close {
            j += 2;
            continue;
         }
         return j;
      }
      j += 1;
   }
   j
}

/// Advance the scanner index past a `--` line comment (until newline or end).
fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
   let mut j = i + 2;
   while j < bytes.len() && bytes[j] != b'\n' {
      j += 1;
   }
   j
}

/// Advance the scanner index past a `/* … */` block comment.
fn skip_block_comment(bytes: &[u8], i: usize) -> usize {
   let len = bytes.len();
   let mut j = i + 2;
   while j + 1 < len {
      if bytes[j] == b'*' && bytes[j + 1] == b'/' {
         return j + 1; // position of the closing `/`
      }
      j += 1;
   }
   len.saturating_sub(1)
}

/// Scan `sql`, calling `on_code` at each position that is outside quotes and
/// comments and is not a parenthesis.
///
/// `on_code` receives `(bytes, position, depth)` where `depth` is the number of
/// currently open parentheses, and returns `Some(T)` to stop or `None` to keep
/// scanning. Positions are byte offsets into `sql`.
pub fn scan<T>(sql: &str, mut on_code: impl FnMut(&[u8], usize, i32) -> Option<T>) -> Option<T> {
   let bytes = sql.as_bytes();
   let len = bytes.len();
   let mut depth: i32 = 0;
   let mut i = 0;

   while i < len {
      match bytes[i] {
         b'(' => depth += 1,
         b')' => depth -= 1,
         b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i, bytes[i]),
         b'[' => i = skip_quoted(bytes, i, b']'),
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => i = skip_line_comment(bytes, i),
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => i = skip_block_comment(bytes, i),
         _ => {
            if let Some(result) = on_code(bytes, i, depth) {
               return Some(result);
            }
         }
      }
      i += 1;
   }

   None
}

/// Like [`scan`], restricted to positions at parenthesis depth 0.
pub fn scan_top_level<T>(sql: &str, mut on_code: impl FnMut(&[u8], usize) -> Option<T>) -> Option<T> {
   scan(sql, |bytes, i, depth| {
      if depth == 0 {
         on_code(bytes, i)
      } else {
         None
      }
   })
}

/// Replace every comment in `sql` with a single space, leaving literals and
/// quoted identifiers untouched.
///
/// A trailing `-- …` comment would otherwise swallow whatever is appended
/// after the statement.
pub fn strip_comments(sql: &str) -> Cow<'_, str> {
   let bytes = sql.as_bytes();
   let len = bytes.len();
   let mut out: Option<String> = None;
   let mut copied = 0;
   let mut i = 0;

   while i < len {
      let comment_end = match bytes[i] {
         b'\'' | b'"' | b'`' => {
            i = skip_quoted(bytes, i, bytes[i]);
            None
         }
         b'[' => {
            i = skip_quoted(bytes, i, b']');
            None
         }
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => Some(skip_line_comment(bytes, i)),
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => Some(skip_block_comment(bytes, i) + 1),
         _ => None,
      };

      match comment_end {
         Some(end) => {
            let out = out.get_or_insert_with(|| String::with_capacity(len));
            out.push_str(&sql[copied..i]);
            out.push(' ');
            copied = end;
            i = end;
         }
         None => i += 1,
      }
   }

   match out {
      Some(mut out) => {
         out.push_str(&sql[copied..]);
         Cow::Owned(out)
      }
      None => Cow::Borrowed(sql),
   }
}

/// Split a batch at each `;` outside literals and comments.
///
/// Pieces are trimmed, and pieces holding only whitespace and comments are
/// dropped, so a trailing `;` adds nothing.
pub fn split_statements(sql: &str) -> Vec<&str> {
   let mut pieces = Vec::new();
   let mut start = 0;

   scan::<()>(sql, |bytes, i, _depth| {
      if bytes[i] == b';' {
         pieces.push(&sql[start..i]);
         start = i + 1;
      }
      None
   });
   pieces.push(&sql[start..]);

   pieces
      .into_iter()
      .filter(|piece| !strip_comments(piece).trim().is_empty())
      .map(str::trim)
      .collect()
}
