//! Pascal VOC XML rendering.

use std::io::Write;

use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::error::{ConvertError, Result};
use crate::voc::{AnnotationDocument, Object};

const INDENT: &str = "  ";

/// Render a document as indented VOC XML.
///
/// Element order is fixed: folder, filename, path, source, size, segmented,
/// then one `object` per box in document order. The document is validated
/// first so nothing is emitted for an incomplete one.
pub fn write_xml<W: Write>(doc: &AnnotationDocument, sink: W) -> Result<()> {
    doc.validate()?;

    let mut writer = EmitterConfig::new()
        .perform_indent(true)
        .indent_string(INDENT)
        .create_writer(sink);

    writer.write(XmlEvent::start_element("annotation"))?;
    write_leaf(&mut writer, "folder", &doc.folder)?;
    write_leaf(&mut writer, "filename", &doc.filename)?;
    write_leaf(&mut writer, "path", &doc.path)?;

    writer.write(XmlEvent::start_element("source"))?;
    write_leaf(&mut writer, "database", &doc.source.database)?;
    writer.write(XmlEvent::end_element())?;

    writer.write(XmlEvent::start_element("size"))?;
    write_leaf(&mut writer, "width", &doc.size.width.to_string())?;
    write_leaf(&mut writer, "height", &doc.size.height.to_string())?;
    write_leaf(&mut writer, "depth", &doc.size.depth.to_string())?;
    writer.write(XmlEvent::end_element())?;

    write_leaf(&mut writer, "segmented", &doc.segmented.to_string())?;

    for object in &doc.objects {
        write_object(&mut writer, object)?;
    }

    writer.write(XmlEvent::end_element())?;

    let mut sink = writer.into_inner();
    sink.write_all(b"\n").map_err(ConvertError::Write)?;
    Ok(())
}

/// Render a document to a `String`.
pub fn to_xml_string(doc: &AnnotationDocument) -> Result<String> {
    let mut buffer = Vec::with_capacity(512 + doc.objects.len() * 160);
    write_xml(doc, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ConvertError::malformed_document(e.to_string()))
}

fn write_object<W: Write>(writer: &mut EventWriter<W>, object: &Object) -> Result<()> {
    writer.write(XmlEvent::start_element("object"))?;
    write_leaf(writer, "name", &object.name)?;

    writer.write(XmlEvent::start_element("bndbox"))?;
    write_leaf(writer, "xmin", &object.bndbox.xmin.to_string())?;
    write_leaf(writer, "ymin", &object.bndbox.ymin.to_string())?;
    write_leaf(writer, "xmax", &object.bndbox.xmax.to_string())?;
    write_leaf(writer, "ymax", &object.bndbox.ymax.to_string())?;
    writer.write(XmlEvent::end_element())?;

    writer.write(XmlEvent::end_element())?;
    Ok(())
}

fn write_leaf<W: Write>(writer: &mut EventWriter<W>, name: &str, text: &str) -> Result<()> {
    writer.write(XmlEvent::start_element(name))?;
    writer.write(XmlEvent::characters(text))?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}
