//! In-memory builder for binary XML test documents.

use resbin_res::{ResValue, StringRef, NO_ENTRY};

/// Encode a chunk with a plain 8-byte-plus-extension header.
pub(crate) fn chunk(type_id: u16, header_size: u16, body: &[u8]) -> Vec<u8> {
    let total = 8 + body.len() as u32;
    let mut out = Vec::with_capacity(total as usize);
    out.extend(type_id.to_le_bytes());
    out.extend(header_size.to_le_bytes());
    out.extend(total.to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// An attribute to place on a built element.
pub(crate) struct TestAttribute<'a> {
    pub namespace: Option<&'a str>,
    pub name: &'a str,
    pub raw_value: Option<&'a str>,
    pub typed_value: TestValue<'a>,
}

/// Typed attribute value; `String` values are interned into the pool.
pub(crate) enum TestValue<'a> {
    String(&'a str),
    Value(ResValue),
}

impl<'a> TestAttribute<'a> {
    /// A string attribute whose raw and typed values are both `value`.
    pub fn string(namespace: Option<&'a str>, name: &'a str, value: &'a str) -> Self {
        Self {
            namespace,
            name,
            raw_value: Some(value),
            typed_value: TestValue::String(value),
        }
    }

    /// A compiled attribute without a raw string value.
    pub fn typed(namespace: Option<&'a str>, name: &'a str, value: ResValue) -> Self {
        Self {
            namespace,
            name,
            raw_value: None,
            typed_value: TestValue::Value(value),
        }
    }
}

/// Assembles chunks for parser tests.
///
/// Strings are interned in first-use order; the string pool (UTF-8) and the
/// optional resource map are emitted ahead of the node chunks.
#[derive(Debug, Default)]
pub(crate) struct DocumentBuilder {
    strings: Vec<String>,
    resource_ids: Vec<u32>,
    chunks: Vec<u8>,
    line: u32,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s` in the pool, adding it if needed.
    pub fn intern(&mut self, s: &str) -> u32 {
        match self.strings.iter().position(|existing| existing == s) {
            Some(index) => index as u32,
            None => {
                self.strings.push(s.to_string());
                (self.strings.len() - 1) as u32
            }
        }
    }

    fn intern_opt(&mut self, s: Option<&str>) -> u32 {
        s.map_or(NO_ENTRY, |s| self.intern(s))
    }

    /// Assign resource ids to the first strings of the pool.
    pub fn resource_ids(&mut self, ids: &[u32]) -> &mut Self {
        self.resource_ids = ids.to_vec();
        self
    }

    fn node(&mut self, type_id: u16, ext: &[u8]) -> &mut Self {
        self.line += 1;
        let mut body = Vec::new();
        body.extend(self.line.to_le_bytes());
        body.extend(NO_ENTRY.to_le_bytes());
        body.extend_from_slice(ext);
        self.chunks.extend(chunk(type_id, 16, &body));
        self
    }

    fn pair(&mut self, first: Option<&str>, second: Option<&str>) -> Vec<u8> {
        let first = self.intern_opt(first);
        let second = self.intern_opt(second);
        [first, second].iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn start_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        let ext = self.pair(Some(prefix), Some(uri));
        self.node(0x0100, &ext)
    }

    pub fn end_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        let ext = self.pair(Some(prefix), Some(uri));
        self.node(0x0101, &ext)
    }

    pub fn start_element(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        attributes: &[TestAttribute<'_>],
    ) -> &mut Self {
        self.start_element_indexed(namespace, name, attributes, [0, 0, 0])
    }

    /// Start element with 1-based id/class/style attribute indices.
    pub fn start_element_indexed(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        attributes: &[TestAttribute<'_>],
        indices: [u16; 3],
    ) -> &mut Self {
        let mut ext = self.pair(namespace, Some(name));
        for v in [20u16, 20, attributes.len() as u16] {
            ext.extend(v.to_le_bytes());
        }
        for v in indices {
            ext.extend(v.to_le_bytes());
        }

        for attribute in attributes {
            let namespace = self.intern_opt(attribute.namespace);
            let name = self.intern(attribute.name);
            let raw_value = self.intern_opt(attribute.raw_value);
            let typed_value = match attribute.typed_value {
                TestValue::String(s) => ResValue::string(StringRef::new(self.intern(s))),
                TestValue::Value(value) => value,
            };
            for v in [namespace, name, raw_value] {
                ext.extend(v.to_le_bytes());
            }
            ext.extend(typed_value.to_bytes());
        }
        self.node(0x0102, &ext)
    }

    pub fn end_element(&mut self, namespace: Option<&str>, name: &str) -> &mut Self {
        let ext = self.pair(namespace, Some(name));
        self.node(0x0103, &ext)
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        let index = self.intern(text);
        let mut ext = index.to_le_bytes().to_vec();
        ext.extend(ResValue::string(StringRef::new(index)).to_bytes());
        self.node(0x0104, &ext)
    }

    /// Append an arbitrary chunk.
    pub fn raw_chunk(&mut self, type_id: u16, header_size: u16, body: &[u8]) -> &mut Self {
        self.chunks.extend(chunk(type_id, header_size, body));
        self
    }

    fn string_pool(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for s in &self.strings {
            offsets.push(data.len() as u32);
            let chars = s.encode_utf16().count();
            assert!(chars < 0x80 && s.len() < 0x80, "test strings must be short");
            data.push(chars as u8);
            data.push(s.len() as u8);
            data.extend_from_slice(s.as_bytes());
            data.push(0);
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let strings_start = 28 + 4 * self.strings.len() as u32;
        let mut body = Vec::new();
        for v in [self.strings.len() as u32, 0, 1 << 8, strings_start, 0] {
            body.extend(v.to_le_bytes());
        }
        for offset in offsets {
            body.extend(offset.to_le_bytes());
        }
        body.extend(data);
        chunk(0x0001, 28, &body)
    }

    /// String pool, resource map and node chunks without the document root.
    pub fn build_unwrapped(&self) -> Vec<u8> {
        let mut out = self.string_pool();
        if !self.resource_ids.is_empty() {
            let ids: Vec<u8> = self.resource_ids.iter().flat_map(|id| id.to_le_bytes()).collect();
            out.extend(chunk(0x0180, 8, &ids));
        }
        out.extend_from_slice(&self.chunks);
        out
    }

    /// A complete document wrapped in the root chunk.
    pub fn build(&self) -> Vec<u8> {
        chunk(0x0003, 8, &self.build_unwrapped())
    }
}
