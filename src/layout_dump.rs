use crate::ir::CropWindow;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: u32,
    pub height: u32,
    pub orientation: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropWindow>,
    pub font_size: u32,
    pub passes: usize,
    pub unresolved: usize,
    pub persons: Vec<PersonDump>,
    pub labels: Vec<LabelDump>,
}

#[derive(Debug, Serialize)]
pub struct PersonDump {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub person: usize,
    pub text: String,
    pub lines: Vec<String>,
    pub position: String,
    pub rows: usize,
    pub alignment: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub clashing: bool,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let persons = layout
            .persons
            .iter()
            .map(|person| PersonDump {
                name: person.name.clone(),
                x: person.rect.x,
                y: person.rect.y,
                width: person.rect.w,
                height: person.rect.h,
            })
            .collect();

        let labels = layout
            .labels
            .iter()
            .map(|label| LabelDump {
                person: label.person,
                text: label.text.clone(),
                lines: label.lines.clone(),
                position: label.position().to_string(),
                rows: label.rows(),
                alignment: label.alignment.to_string(),
                x: label.rect.x,
                y: label.rect.y,
                width: label.rect.w,
                height: label.rect.h,
                clashing: label.clashing,
            })
            .collect();

        LayoutDump {
            width: layout.dimension.width,
            height: layout.dimension.height,
            orientation: layout.dimension.orientation.degrees(),
            crop: layout.crop,
            font_size: layout.font_size,
            passes: layout.passes,
            unresolved: layout.unresolved(),
            persons,
            labels,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
