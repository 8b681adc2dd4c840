//! Runtime lookups over the validated config: endpoint resolution by version and name.

use crate::config::{ApiConfig, EndpointConfig, HttpMethod};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Routing key attached to each mounted endpoint route. `version` is set only when the
/// version is part of the URL; otherwise it is negotiated per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointKey {
    pub version: Option<String>,
    pub endpoint: String,
}

impl ApiConfig {
    pub fn endpoint(&self, version: &str, name: &str) -> Option<&EndpointConfig> {
        self.versions.get(version)?.get(name)
    }

    /// Greatest version label in [`compare_version_labels`] order; used when a request
    /// does not ask for one.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions
            .keys()
            .max_by(|a, b| compare_version_labels(a, b))
            .map(String::as_str)
    }

    /// Pick the requested version if configured, or the latest when none is requested.
    pub fn resolve_version<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        match requested {
            Some(v) => self.versions.get_key_value(v).map(|(k, _)| k.as_str()),
            None => self.latest_version(),
        }
    }

    /// Every distinct repository identifier referenced by any endpoint.
    pub fn repository_ids(&self) -> BTreeSet<&str> {
        self.versions
            .values()
            .flat_map(|endpoints| endpoints.values())
            .map(|e| e.repository.as_str())
            .collect()
    }

    /// Route table: one entry per mounted collection path, with the union of methods the
    /// path must accept. With `version_in_url` each (version, endpoint) pair gets its own
    /// path; otherwise endpoints sharing a name across versions share one path.
    pub fn route_table(&self) -> BTreeMap<String, (EndpointKey, BTreeSet<HttpMethod>)> {
        let mut table: BTreeMap<String, (EndpointKey, BTreeSet<HttpMethod>)> = BTreeMap::new();
        for (version, endpoints) in &self.versions {
            for (name, endpoint) in endpoints {
                let (path, key) = if self.version_in_url {
                    (
                        format!("/{}/{}", version, name),
                        EndpointKey {
                            version: Some(version.clone()),
                            endpoint: name.clone(),
                        },
                    )
                } else {
                    (
                        format!("/{}", name),
                        EndpointKey {
                            version: None,
                            endpoint: name.clone(),
                        },
                    )
                };
                table
                    .entry(path)
                    .or_insert_with(|| (key, BTreeSet::new()))
                    .1
                    .extend(endpoint.methods.iter().copied());
            }
        }
        table
    }
}

/// Natural order for version labels: runs of digits compare by value, everything else
/// by string (`v2 < v10`, `1.9 < 1.10`). Labels equal in that order fall back to plain
/// string order so the result is total.
pub fn compare_version_labels(a: &str, b: &str) -> Ordering {
    let (mut left, mut right) = (a, b);
    loop {
        match (next_chunk(left), next_chunk(right)) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((l, l_rest)), Some((r, r_rest))) => {
                let ord = if starts_with_digit(l) && starts_with_digit(r) {
                    let (l, r) = (l.trim_start_matches('0'), r.trim_start_matches('0'));
                    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
                } else {
                    l.cmp(r)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                left = l_rest;
                right = r_rest;
            }
        }
    }
}

/// Split off the leading run of digits or non-digits.
fn next_chunk(s: &str) -> Option<(&str, &str)> {
    let digit = starts_with_digit(s);
    if s.is_empty() {
        return None;
    }
    let end = s.find(|c: char| c.is_ascii_digit() != digit).unwrap_or(s.len());
    Some(s.split_at(end))
}

fn starts_with_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

impl EndpointConfig {
    pub fn allows(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Whether a body field may be written. `_id` is always accepted; an empty
    /// `allow_fields` list places no restriction.
    pub fn accepts_field(&self, field: &str) -> bool {
        field == "_id"
            || self.allow_extra_fields
            || self.allow_fields.is_empty()
            || self.allow_fields.iter().any(|f| f == field)
    }
}
