// ── Field specifications and path templates ──
//
// A field specification is the XPath-like string naming every container
// on the way to a leaf, e.g.
//
//   /lldp/interfaces/interface[name={local_interface}]/neighbors/neighbor/state/system-name
//
// Key values written as `{field}` are placeholders: they are left out of
// the query (matching every instance) and become bindings telling the
// walker which element and key carry that identity field. Literal key
// values (`[name=default]`) stay in the query as filters.

use std::fmt;
use std::marker::PhantomData;

use netstate_api::{DataType, Encoding, GetRequest, Path, PathElem, ValueKind};
use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::walker::LeafValue;

// ── Identity fields ─────────────────────────────────────────────────

/// Semantic identity a key value can be bound to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IdentityField {
    VrfName,
    NeighborAddr,
    Safi,
    LocalInterface,
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path spec '{spec}': {reason}")]
pub struct PathSpecError {
    pub spec: String,
    pub reason: String,
}

impl PathSpecError {
    fn new(spec: &str, reason: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

// ── Parsed template ─────────────────────────────────────────────────

/// How a key of a template segment is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKey {
    /// Fixed value sent with the query.
    Literal { name: String, value: String },
    /// Wildcard whose returned value is bound to an identity field.
    Bind { name: String, field: IdentityField },
}

impl SegmentKey {
    pub fn name(&self) -> &str {
        match self {
            Self::Literal { name, .. } | Self::Bind { name, .. } => name,
        }
    }
}

/// One container of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub keys: Vec<SegmentKey>,
}

/// Where an identity field lives in a returned path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub field: IdentityField,
    /// Index into the returned path's elements.
    pub segment: usize,
    /// Element name expected at `segment`.
    pub element: String,
    /// Key of that element carrying the value.
    pub key: String,
}

/// A parsed field specification: ordered segments plus the binding table
/// derived from their placeholders.
///
/// Segment order is the protocol's subtree layout. The walker trusts the
/// binding indexes, so a template is the single source of both the query
/// path and the extraction positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    origin: Option<String>,
    segments: Vec<Segment>,
    bindings: Vec<Binding>,
}

impl PathTemplate {
    /// Parse a field specification.
    pub fn parse(spec: &str) -> Result<Self, PathSpecError> {
        let (origin, body) = split_origin(spec);
        let raw = split_elements(spec, body)?;

        let mut segments = Vec::with_capacity(raw.len());
        let mut bindings = Vec::new();

        for (index, elem) in raw.into_iter().enumerate() {
            let mut keys = Vec::with_capacity(elem.keys.len());
            for (name, value) in elem.keys {
                if keys.iter().any(|k: &SegmentKey| k.name() == name) {
                    return Err(PathSpecError::new(
                        spec,
                        format!("duplicate key '{name}' on element '{}'", elem.name),
                    ));
                }
                match placeholder(&value) {
                    Some(field_name) => {
                        let field: IdentityField = field_name.parse().map_err(|_| {
                            PathSpecError::new(
                                spec,
                                format!("unknown identity field '{{{field_name}}}'"),
                            )
                        })?;
                        if bindings.iter().any(|b: &Binding| b.field == field) {
                            return Err(PathSpecError::new(
                                spec,
                                format!("identity field '{field}' bound twice"),
                            ));
                        }
                        bindings.push(Binding {
                            field,
                            segment: index,
                            element: elem.name.clone(),
                            key: name.clone(),
                        });
                        keys.push(SegmentKey::Bind { name, field });
                    }
                    None => keys.push(SegmentKey::Literal { name, value }),
                }
            }
            segments.push(Segment {
                name: elem.name,
                keys,
            });
        }

        Ok(Self {
            origin,
            segments,
            bindings,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Binding table, in path order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Identity fields this template produces, in path order.
    pub fn fields(&self) -> Vec<IdentityField> {
        self.bindings.iter().map(|b| b.field).collect()
    }

    /// The gNMI path to request: placeholders dropped, literal keys kept.
    pub fn query_path(&self) -> Path {
        let elem = self
            .segments
            .iter()
            .map(|seg| {
                seg.keys.iter().fold(PathElem::new(&seg.name), |elem, key| match key {
                    SegmentKey::Literal { name, value } => elem.with_key(name, value),
                    SegmentKey::Bind { .. } => elem,
                })
            })
            .collect();
        Path {
            origin: self.origin.clone(),
            elem,
        }
    }

    /// Build the structured query for this template.
    pub fn query(&self, data_type: DataType, encoding: Encoding) -> PathQuery {
        PathQuery {
            path: self.query_path(),
            data_type,
            encoding,
        }
    }
}

/// Renders the template back into field-specification form.
impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = &self.origin {
            write!(f, "{origin}:")?;
        }
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{}", seg.name)?;
            for key in &seg.keys {
                match key {
                    SegmentKey::Literal { name, value } => {
                        write!(f, "[{name}=")?;
                        for c in value.chars() {
                            if matches!(c, ']' | '\\') {
                                f.write_str("\\")?;
                            }
                            write!(f, "{c}")?;
                        }
                        f.write_str("]")?;
                    }
                    SegmentKey::Bind { name, field } => write!(f, "[{name}={{{field}}}]")?,
                }
            }
        }
        Ok(())
    }
}

// ── Queries ─────────────────────────────────────────────────────────

/// A resolved query, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    pub path: Path,
    pub data_type: DataType,
    pub encoding: Encoding,
}

impl PathQuery {
    pub fn to_request(&self) -> GetRequest {
        GetRequest::single(self.path.clone(), self.data_type, self.encoding)
    }
}

// ── Typed field specifications ──────────────────────────────────────

/// A named field specification whose leaf value type is fixed at
/// definition time.
pub struct FieldSpec<V> {
    pub name: &'static str,
    pub spec: &'static str,
    _leaf: PhantomData<fn() -> V>,
}

impl<V: LeafValue> FieldSpec<V> {
    pub const fn new(name: &'static str, spec: &'static str) -> Self {
        Self {
            name,
            spec,
            _leaf: PhantomData,
        }
    }

    /// Leaf value kind every update of this field must carry.
    pub fn kind(&self) -> ValueKind {
        V::KIND
    }

    pub fn resolve(&self) -> Result<TypedTemplate<V>, PathSpecError> {
        Ok(TypedTemplate {
            name: self.name,
            template: PathTemplate::parse(self.spec)?,
            _leaf: PhantomData,
        })
    }
}

/// A parsed template paired with its leaf value type.
#[derive(Debug, Clone)]
pub struct TypedTemplate<V> {
    pub name: &'static str,
    pub template: PathTemplate,
    _leaf: PhantomData<fn() -> V>,
}

impl<V: LeafValue> TypedTemplate<V> {
    pub fn query(&self, data_type: DataType, encoding: Encoding) -> PathQuery {
        self.template.query(data_type, encoding)
    }
}

/// BGP neighbor session state, per VRF and neighbor.
pub const BGP_SESSION_STATE: FieldSpec<String> = FieldSpec::new(
    "bgp-session-state",
    "/network-instances/network-instance[name={vrf_name}]/protocols/protocol/bgp/neighbors\
     /neighbor[neighbor-address={neighbor_addr}]/state/session-state",
);

/// Whether an AFI-SAFI is enabled for a BGP neighbor.
pub const BGP_AFI_SAFI_ENABLED: FieldSpec<bool> = FieldSpec::new(
    "bgp-afi-safi-enabled",
    "/network-instances/network-instance[name={vrf_name}]/protocols/protocol/bgp/neighbors\
     /neighbor[neighbor-address={neighbor_addr}]/afi-safis/afi-safi[afi-safi-name={safi}]\
     /config/enabled",
);

/// Prefixes received from a BGP neighbor for one AFI-SAFI.
pub const BGP_PREFIXES_RECEIVED: FieldSpec<u64> = FieldSpec::new(
    "bgp-prefixes-received",
    "/network-instances/network-instance[name={vrf_name}]/protocols/protocol/bgp/neighbors\
     /neighbor[neighbor-address={neighbor_addr}]/afi-safis/afi-safi[afi-safi-name={safi}]\
     /state/prefixes/received",
);

/// LLDP neighbor system name, per local interface.
pub const LLDP_SYSTEM_NAME: FieldSpec<String> = FieldSpec::new(
    "lldp-system-name",
    "/lldp/interfaces/interface[name={local_interface}]/neighbors/neighbor/state/system-name",
);

/// Name, specification and value kind of every built-in field.
pub fn builtin_fields() -> [(&'static str, &'static str, ValueKind); 4] {
    [
        (BGP_SESSION_STATE.name, BGP_SESSION_STATE.spec, BGP_SESSION_STATE.kind()),
        (BGP_AFI_SAFI_ENABLED.name, BGP_AFI_SAFI_ENABLED.spec, BGP_AFI_SAFI_ENABLED.kind()),
        (BGP_PREFIXES_RECEIVED.name, BGP_PREFIXES_RECEIVED.spec, BGP_PREFIXES_RECEIVED.kind()),
        (LLDP_SYSTEM_NAME.name, LLDP_SYSTEM_NAME.spec, LLDP_SYSTEM_NAME.kind()),
    ]
}

// ── Parsing helpers ─────────────────────────────────────────────────

#[derive(Default)]
struct RawElem {
    name: String,
    keys: Vec<(String, String)>,
}

/// Split `origin:/path` into its origin and path parts.
fn split_origin(spec: &str) -> (Option<String>, &str) {
    match spec.split_once(":/") {
        Some((origin, _)) if !origin.is_empty() && !origin.contains(['/', '[', ']', '=']) => {
            (Some(origin.to_owned()), &spec[origin.len() + 1..])
        }
        _ => (None, spec),
    }
}

fn placeholder(value: &str) -> Option<&str> {
    value.strip_prefix('{')?.strip_suffix('}')
}

fn split_elements(spec: &str, body: &str) -> Result<Vec<RawElem>, PathSpecError> {
    let body = body.strip_prefix('/').unwrap_or(body);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut cur = RawElem::default();
    let mut chars = body.chars();

    loop {
        match chars.next() {
            None => {
                out.push(finish_elem(spec, cur, out.len())?);
                return Ok(out);
            }
            Some('/') => {
                out.push(finish_elem(spec, cur, out.len())?);
                cur = RawElem::default();
            }
            Some('[') => {
                if cur.name.is_empty() {
                    return Err(PathSpecError::new(
                        spec,
                        format!("key without element name at element {}", out.len()),
                    ));
                }
                let key = read_key(spec, &cur.name, &mut chars)?;
                cur.keys.push(key);
            }
            Some(']') => {
                return Err(PathSpecError::new(
                    spec,
                    format!("unbalanced ']' in element {}", out.len()),
                ));
            }
            Some(c) => {
                if !cur.keys.is_empty() {
                    return Err(PathSpecError::new(
                        spec,
                        format!("unexpected '{c}' after key of element '{}'", cur.name),
                    ));
                }
                cur.name.push(c);
            }
        }
    }
}

fn finish_elem(spec: &str, elem: RawElem, index: usize) -> Result<RawElem, PathSpecError> {
    if elem.name.is_empty() {
        return Err(PathSpecError::new(spec, format!("empty element name at element {index}")));
    }
    Ok(elem)
}

/// Read `name=value]` after an opening bracket. `\` escapes the next
/// character inside the value.
fn read_key(
    spec: &str,
    elem: &str,
    chars: &mut std::str::Chars<'_>,
) -> Result<(String, String), PathSpecError> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('=') => break,
            Some(c @ ('[' | ']' | '/')) => {
                return Err(PathSpecError::new(
                    spec,
                    format!("key of element '{elem}' has no '=' before '{c}'"),
                ));
            }
            Some(c) => name.push(c),
            None => {
                return Err(PathSpecError::new(
                    spec,
                    format!("unterminated key on element '{elem}'"),
                ));
            }
        }
    }
    if name.is_empty() {
        return Err(PathSpecError::new(
            spec,
            format!("empty key name on element '{elem}'"),
        ));
    }

    let mut value = String::new();
    loop {
        match chars.next() {
            Some(']') => return Ok((name, value)),
            Some('\\') => match chars.next() {
                Some(c) => value.push(c),
                None => break,
            },
            Some(c) => value.push(c),
            None => break,
        }
    }
    Err(PathSpecError::new(
        spec,
        format!("unterminated value for key '{name}' on element '{elem}'"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn session_state_binds_vrf_and_neighbor() {
        let t = BGP_SESSION_STATE.resolve().unwrap().template;
        let bindings: Vec<_> = t
            .bindings()
            .iter()
            .map(|b| (b.field, b.segment, b.element.as_str(), b.key.as_str()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                (IdentityField::VrfName, 1, "network-instance", "name"),
                (IdentityField::NeighborAddr, 6, "neighbor", "neighbor-address"),
            ]
        );
        assert_eq!(t.segments().len(), 9);
    }

    #[test]
    fn afi_safi_templates_share_binding_positions() {
        let enabled = BGP_AFI_SAFI_ENABLED.resolve().unwrap().template;
        let received = BGP_PREFIXES_RECEIVED.resolve().unwrap().template;
        assert_eq!(enabled.bindings(), received.bindings());
        assert_eq!(
            enabled.fields(),
            vec![
                IdentityField::VrfName,
                IdentityField::NeighborAddr,
                IdentityField::Safi
            ]
        );
        assert_eq!(enabled.bindings()[2].segment, 8);
    }

    #[test]
    fn lldp_binds_local_interface() {
        let t = LLDP_SYSTEM_NAME.resolve().unwrap().template;
        assert_eq!(t.bindings().len(), 1);
        assert_eq!(t.bindings()[0].field, IdentityField::LocalInterface);
        assert_eq!(t.bindings()[0].segment, 2);
    }

    #[test]
    fn query_path_drops_placeholders() {
        let t = BGP_SESSION_STATE.resolve().unwrap();
        let q = t.query(DataType::State, Encoding::JsonIetf);
        assert_eq!(
            q.path.to_string(),
            "/network-instances/network-instance/protocols/protocol/bgp/neighbors/neighbor/state/session-state"
        );
        assert_eq!(q.data_type, DataType::State);
        assert_eq!(q.to_request().path.len(), 1);
    }

    #[test]
    fn literal_keys_stay_in_query() {
        let t = PathTemplate::parse(
            "/network-instances/network-instance[name=mgmt]/protocols/protocol[identifier=BGP][name=BGP]",
        )
        .unwrap();
        assert!(t.bindings().is_empty());
        assert_eq!(
            t.query_path().to_string(),
            "/network-instances/network-instance[name=mgmt]/protocols/protocol[identifier=BGP][name=BGP]"
        );
    }

    #[test]
    fn escaped_and_slashed_key_values() {
        let t = PathTemplate::parse(r"/interfaces/interface[name=Ethernet1/1]/x[k=a\]b]").unwrap();
        let path = t.query_path();
        assert_eq!(path.elem.len(), 3);
        assert_eq!(path.elem[1].key_value("name"), Some("Ethernet1/1"));
        assert_eq!(path.elem[2].key_value("k"), Some("a]b"));
    }

    #[test]
    fn origin_prefix_is_split() {
        let t = PathTemplate::parse("openconfig:/lldp/interfaces").unwrap();
        let path = t.query_path();
        assert_eq!(path.origin.as_deref(), Some("openconfig"));
        assert_eq!(path.elem.len(), 2);
        assert_eq!(t.to_string(), "openconfig:/lldp/interfaces");
    }

    #[test]
    fn root_spec_is_empty_path() {
        let t = PathTemplate::parse("/").unwrap();
        assert!(t.segments().is_empty());
        assert_eq!(t.to_string(), "/");
    }

    #[test]
    fn display_round_trips_builtin_spec() {
        let t = LLDP_SYSTEM_NAME.resolve().unwrap().template;
        assert_eq!(t.to_string(), LLDP_SYSTEM_NAME.spec);
    }

    #[test]
    fn display_escapes_literal_values() {
        let t = PathTemplate::parse(r"/x[k=a\]b][j=c\\d]").unwrap();
        assert_eq!(t.to_string(), r"/x[k=a\]b][j=c\\d]");
        let again = PathTemplate::parse(&t.to_string()).unwrap();
        assert_eq!(again, t);
    }

    #[test]
    fn rejects_malformed_specs() {
        for bad in [
            "/a//b",
            "/a/[k=v]",
            "/a[k=v",
            "/a[kv]",
            "/a[=v]",
            "/a]",
            "/a[k=v]b",
            "/a[k=v][k=w]",
            "/a[k={nope}]",
            "/a[k={vrf_name}]/b[j={vrf_name}]",
        ] {
            assert!(PathTemplate::parse(bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn error_names_the_spec() {
        let err = PathTemplate::parse("/a[k={bogus}]").unwrap_err();
        assert_eq!(err.spec, "/a[k={bogus}]");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn builtin_kinds_are_fixed() {
        let kinds: Vec<_> = builtin_fields().iter().map(|f| f.2).collect();
        assert_eq!(
            kinds,
            vec![ValueKind::String, ValueKind::Bool, ValueKind::Uint, ValueKind::String]
        );
    }
}
