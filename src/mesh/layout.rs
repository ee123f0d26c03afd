//! Vertex layout descriptions shared by meshes and pipelines.

use wgpu::VertexFormat;

/// A single vertex attribute: shader location, data format and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

impl VertexAttribute {
    pub fn new(location: u32, format: VertexFormat, offset: u64) -> Self {
        Self {
            location,
            format,
            offset,
        }
    }

    fn to_wgpu(self) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            format: self.format,
            offset: self.offset,
            shader_location: self.location,
        }
    }
}

/// Layout of one interleaved vertex buffer.
///
/// A mesh carries the layout its data was generated with; a pipeline declares
/// the layout it expects. The two must agree attribute-for-attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices.
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create an empty layout with the given stride.
    pub fn new(stride: u64) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, location: u32, format: VertexFormat, offset: u64) -> Self {
        self.attributes
            .push(VertexAttribute::new(location, format, offset));
        self
    }

    /// Position (float3) + normal (float3) + texcoord (float2), 32 bytes.
    pub fn position_normal_uv() -> Self {
        Self::new(32)
            .with_attribute(0, VertexFormat::Float32x3, 0)
            .with_attribute(1, VertexFormat::Float32x3, 12)
            .with_attribute(2, VertexFormat::Float32x2, 24)
    }

    /// Find the attribute bound to a shader location.
    pub fn attribute_at(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// Attributes in the form wgpu expects for a vertex buffer layout.
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes.iter().map(|a| a.to_wgpu()).collect()
    }

    /// Describe the first difference between two layouts, if any.
    ///
    /// Attributes are compared in declaration order.
    pub fn diff(&self, other: &VertexLayout) -> Option<String> {
        if self.stride != other.stride {
            return Some(format!("stride {} != {}", self.stride, other.stride));
        }
        if self.attributes.len() != other.attributes.len() {
            return Some(format!(
                "{} attributes != {} attributes",
                self.attributes.len(),
                other.attributes.len()
            ));
        }
        self.attributes
            .iter()
            .zip(&other.attributes)
            .enumerate()
            .find(|(_, (a, b))| a != b)
            .map(|(i, (a, b))| {
                format!(
                    "attribute {}: location {} {:?} @{} != location {} {:?} @{}",
                    i, a.location, a.format, a.offset, b.location, b.format, b.offset
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normal_uv_offsets() {
        let layout = VertexLayout::position_normal_uv();
        assert_eq!(layout.stride, 32);
        assert_eq!(layout.attribute_at(1).map(|a| a.offset), Some(12));
        assert_eq!(layout.attribute_at(2).map(|a| a.format), Some(VertexFormat::Float32x2));
        assert!(layout.attribute_at(3).is_none());
    }

    #[test]
    fn test_diff_reports_first_mismatch() {
        let a = VertexLayout::position_normal_uv();
        assert!(a.diff(&a.clone()).is_none());

        let b = VertexLayout::new(32)
            .with_attribute(0, VertexFormat::Float32x3, 0)
            .with_attribute(1, VertexFormat::Float32x3, 16)
            .with_attribute(2, VertexFormat::Float32x2, 24);
        let diff = a.diff(&b).unwrap();
        assert!(diff.starts_with("attribute 1"), "{diff}");

        let c = VertexLayout::new(12).with_attribute(0, VertexFormat::Float32x3, 0);
        assert!(a.diff(&c).unwrap().starts_with("stride"));
    }
}
