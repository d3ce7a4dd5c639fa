//! Parsing of `application/link-format` (RFC6690) documents,
//! as served by `/.well-known/core`.

/// A resource advertised by a server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
  /// Target path of the link (`</sensors/temp>` becomes `/sensors/temp`)
  pub path: String,
  /// `title`
  pub title: String,
  /// Whether the resource is observable (`obs`)
  pub observable: bool,
  /// `rt`
  pub resource_type: String,
  /// `if`
  pub interface: String,
  /// `sz`
  pub maximum_size: Option<u32>,
  /// `ct`; when several are listed, the first
  pub content_format: Option<u16>,
}

/// Parse a CoRE link-format document.
///
/// Links that do not start with `<target>` are skipped, as are
/// attributes that are not understood.
///
/// ```
/// use croak::link_format::parse_core_link_list;
///
/// let doc = br#"</sensors/temp>;rt="temperature-c";if="sensor";obs,</firmware>;sz=262144;ct=42"#;
/// let resources = parse_core_link_list(doc);
///
/// assert_eq!(resources.len(), 2);
/// assert_eq!(resources[0].path, "/sensors/temp");
/// assert!(resources[0].observable);
/// assert_eq!(resources[1].maximum_size, Some(262144));
/// assert_eq!(resources[1].content_format, Some(42));
/// ```
pub fn parse_core_link_list(bytes: &[u8]) -> Vec<Resource> {
  let doc = String::from_utf8_lossy(bytes);

  split_unquoted(&doc, ',').into_iter()
                           .filter_map(|link| {
                             let res = parse_link(link);
                             if res.is_none() {
                               log::debug!("skipping malformed link {:?}", link);
                             }
                             res
                           })
                           .collect()
}

fn parse_link(link: &str) -> Option<Resource> {
  let mut parts = split_unquoted(link.trim(), ';').into_iter();
  let target = parts.next()?.trim();
  let path = target.strip_prefix('<')?.strip_suffix('>')?;

  let mut res = Resource { path: path.to_string(),
                           ..Default::default() };

  for param in parts {
    let (key, value) = match param.split_once('=') {
      | Some((key, value)) => (key.trim(), Some(unquote(value.trim()))),
      | None => (param.trim(), None),
    };

    match (key, value) {
      | ("title", Some(v)) => res.title = v.to_string(),
      | ("rt", Some(v)) => res.resource_type = v.to_string(),
      | ("if", Some(v)) => res.interface = v.to_string(),
      | ("sz", Some(v)) => res.maximum_size = v.parse().ok(),
      | ("ct", Some(v)) => {
        res.content_format = v.split_whitespace()
                              .next()
                              .and_then(|ct| ct.parse().ok())
      },
      | ("obs", _) => res.observable = true,
      | _ => log::trace!("ignoring link attribute {:?} of {}", key, res.path),
    }
  }

  Some(res)
}

fn unquote(value: &str) -> &str {
  value.strip_prefix('"')
       .and_then(|v| v.strip_suffix('"'))
       .unwrap_or(value)
}

/// Split on `sep`, except inside double quotes
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut start = 0;
  let mut quoted = false;

  for (ix, c) in s.char_indices() {
    match c {
      | '"' => quoted = !quoted,
      | c if c == sep && !quoted => {
        parts.push(&s[start..ix]);
        start = ix + c.len_utf8();
      },
      | _ => (),
    }
  }

  parts.push(&s[start..]);
  parts
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn full_attributes() {
    let doc = br#"</a>;title="A, with a comma; and a semicolon";rt="x y";if=core.s;sz=10;ct="0 50";obs"#;

    assert_eq!(parse_core_link_list(doc),
               vec![Resource { path: "/a".into(),
                               title: "A, with a comma; and a semicolon".into(),
                               observable: true,
                               resource_type: "x y".into(),
                               interface: "core.s".into(),
                               maximum_size: Some(10),
                               content_format: Some(0) }]);
  }

  #[test]
  fn whitespace_and_unknown_attributes() {
    let doc = b"</a> ; anchor=\"/b\" ; ct=40 ,\n </b>";
    let res = parse_core_link_list(doc);

    assert_eq!(res.len(), 2);
    assert_eq!(res[0].path, "/a");
    assert_eq!(res[0].content_format, Some(40));
    assert_eq!(res[1], Resource { path: "/b".into(),
                                  ..Default::default() });
  }

  #[test]
  fn malformed_links_are_skipped() {
    assert_eq!(parse_core_link_list(b""), vec![]);
    assert_eq!(parse_core_link_list(b"nope,</ok>,<unterminated")
                 .into_iter()
                 .map(|r| r.path)
                 .collect::<Vec<_>>(),
               vec!["/ok".to_string()]);
  }

  #[test]
  fn bad_numbers_are_none() {
    let res = parse_core_link_list(b"</a>;sz=big;ct=-1");
    assert_eq!((res[0].maximum_size, res[0].content_format), (None, None));
  }

  #[cfg(feature = "serde")]
  #[test]
  fn serde_round_trip() {
    let res = parse_core_link_list(br#"</a>;rt="t";obs"#);
    let json = serde_json::to_string(&res).unwrap();
    let back: Vec<Resource> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, res);
  }
}
