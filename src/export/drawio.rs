use std::{collections::HashMap, fmt, io};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesDecl, Event},
};

use crate::domain::{ArrowDirection, Element, ElementKind, LineStyle, Model, Relationship};

const CELL_WIDTH: f64 = 220.0;
const CELL_HEIGHT: f64 = 120.0;
const MARGIN: f64 = 50.0;
const MIN_PAGE_WIDTH: f64 = 1100.0;
const MIN_PAGE_HEIGHT: f64 = 850.0;

/// Renders a model as a draw.io (diagrams.net) document.
///
/// Every element except shadows becomes a vertex at its canvas position,
/// shifted so that nothing sits closer than a fixed margin to the page edge.
/// Relationships become edges styled from their arrow direction and line
/// style; relationships with an end that is not drawn are skipped.
#[derive(Debug, Clone, Copy)]
pub struct Drawio<'a> {
    model: &'a Model,
    modified: DateTime<Utc>,
}

/// Renders `model` as a draw.io document stamped with the current time.
#[must_use]
pub fn drawio(model: &Model) -> String {
    Drawio::new(model).to_string()
}

impl<'a> Drawio<'a> {
    /// A renderer stamped with the current time.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self::at(model, Utc::now())
    }

    /// A renderer stamped with `modified`.
    #[must_use]
    pub const fn at(model: &'a Model, modified: DateTime<Utc>) -> Self {
        Self { model, modified }
    }

    fn render(&self) -> io::Result<String> {
        let model = self.model;
        let elements: Vec<&Element> = [
            &model.people,
            &model.systems,
            &model.external_systems,
            &model.containers,
            &model.components,
        ]
        .into_iter()
        .flatten()
        .collect();
        let page = Page::fit(&elements);

        let modified = self.modified.to_rfc3339_opts(SecondsFormat::Millis, true);
        let diagram_id = format!("diagram-{}", self.modified.timestamp_millis());
        let name = if model.metadata.name.trim().is_empty() {
            "C4 Diagram"
        } else {
            model.metadata.name.as_str()
        };
        let page_width = page.width.to_string();
        let page_height = page.height.to_string();

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer
            .create_element("mxfile")
            .with_attributes([
                ("host", "c4m"),
                ("modified", modified.as_str()),
                ("agent", "c4-modeller"),
                ("version", "1.0"),
                ("type", "device"),
            ])
            .write_inner_content(|w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                w.create_element("diagram")
                    .with_attributes([("name", name), ("id", diagram_id.as_str())])
                    .write_inner_content(|w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                        w.create_element("mxGraphModel")
                            .with_attributes([
                                ("dx", "0"),
                                ("dy", "0"),
                                ("grid", "1"),
                                ("gridSize", "10"),
                                ("guides", "1"),
                                ("tooltips", "1"),
                                ("connect", "1"),
                                ("arrows", "1"),
                                ("fold", "1"),
                                ("page", "1"),
                                ("pageScale", "1"),
                                ("pageWidth", page_width.as_str()),
                                ("pageHeight", page_height.as_str()),
                                ("background", "#ffffff"),
                                ("math", "0"),
                                ("shadow", "0"),
                            ])
                            .write_inner_content(|w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                                w.create_element("root").write_inner_content(
                                    |w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                                        write_cells(w, &elements, &model.relationships, &page)
                                    },
                                )?;
                                Ok(())
                            })?;
                        Ok(())
                    })?;
                Ok(())
            })?;

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

impl fmt::Display for Drawio<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

/// Page size and the shift applied to every element.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Page {
    offset_x: f64,
    offset_y: f64,
    width: f64,
    height: f64,
}

impl Page {
    fn fit(elements: &[&Element]) -> Self {
        if elements.is_empty() {
            return Self {
                offset_x: 0.0,
                offset_y: 0.0,
                width: MIN_PAGE_WIDTH,
                height: MIN_PAGE_HEIGHT,
            };
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for element in elements {
            let position = element.position;
            min_x = min_x.min(position.x);
            min_y = min_y.min(position.y);
            max_x = max_x.max(position.x + CELL_WIDTH);
            max_y = max_y.max(position.y + CELL_HEIGHT);
        }

        let offset_x = (MARGIN - min_x).max(0.0);
        let offset_y = (MARGIN - min_y).max(0.0);
        Self {
            offset_x,
            offset_y,
            width: (max_x + offset_x + 100.0).max(MIN_PAGE_WIDTH),
            height: (max_y + offset_y + 100.0).max(MIN_PAGE_HEIGHT),
        }
    }
}

fn write_cells(
    w: &mut Writer<Vec<u8>>,
    elements: &[&Element],
    relationships: &[Relationship],
    page: &Page,
) -> io::Result<()> {
    w.create_element("mxCell").with_attribute(("id", "0")).write_empty()?;
    w.create_element("mxCell")
        .with_attributes([("id", "1"), ("parent", "0")])
        .write_empty()?;

    // cell numbers are shared by vertices and edges, skipped edges included
    let mut next = 2..;
    let mut cells: HashMap<&str, String> = HashMap::new();

    for element in elements {
        let id = format!("cell-{}", next.next().unwrap_or_default());
        let x = (element.position.x + page.offset_x).to_string();
        let y = (element.position.y + page.offset_y).to_string();
        let width = CELL_WIDTH.to_string();
        let height = CELL_HEIGHT.to_string();
        let value = vertex_label(element);

        w.create_element("mxCell")
            .with_attributes([
                ("id", id.as_str()),
                ("value", value.as_str()),
                ("style", vertex_style(element.kind)),
                ("vertex", "1"),
                ("parent", "1"),
            ])
            .write_inner_content(|w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                w.create_element("mxGeometry")
                    .with_attributes([
                        ("x", x.as_str()),
                        ("y", y.as_str()),
                        ("width", width.as_str()),
                        ("height", height.as_str()),
                        ("as", "geometry"),
                    ])
                    .write_empty()?;
                Ok(())
            })?;
        cells.insert(element.id.as_str(), id);
    }

    for relationship in relationships {
        let id = format!("edge-{}", next.next().unwrap_or_default());
        let (Some(source), Some(target)) = (
            cells.get(relationship.from.as_str()),
            cells.get(relationship.to.as_str()),
        ) else {
            continue;
        };
        let value = edge_label(relationship);
        let style = edge_style(relationship);

        w.create_element("mxCell")
            .with_attributes([
                ("id", id.as_str()),
                ("value", value.as_str()),
                ("style", style.as_str()),
                ("edge", "1"),
                ("parent", "1"),
                ("source", source.as_str()),
                ("target", target.as_str()),
            ])
            .write_inner_content(|w: &mut Writer<Vec<u8>>| -> io::Result<()> {
                w.create_element("mxGeometry")
                    .with_attributes([("relative", "1"), ("as", "geometry")])
                    .write_empty()?;
                Ok(())
            })?;
    }
    Ok(())
}

/// The HTML label of a vertex: bold name, kind and technology, then the
/// description.
fn vertex_label(element: &Element) -> String {
    let mut label = format!(
        "<b>{}</b><br><font style=\"font-size: 10px; color: #666666;\">[{}]",
        escape(&element.name),
        kind_label(element.kind)
    );
    if !element.technology.is_empty() {
        label.push_str(&format!("<br>[{}]", escape(&element.technology)));
    }
    label.push_str("</font>");
    if !element.description.is_empty() {
        label.push_str(&format!(
            "<br><font style=\"font-size: 10px\">{}</font>",
            escape(&element.description)
        ));
    }
    label
}

fn edge_label(relationship: &Relationship) -> String {
    let description = escape(&relationship.description);
    if relationship.technology.is_empty() {
        description.into_owned()
    } else {
        format!(
            "{description}<br><font style=\"font-size: 9px\">[{}]</font>",
            escape(&relationship.technology)
        )
    }
}

const fn kind_label(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Person => "Person",
        ElementKind::System => "Software System",
        ElementKind::ExternalSystem => "External System",
        ElementKind::Container => "Container",
        ElementKind::Component => "Component",
        ElementKind::Shadow => "Shadow",
    }
}

const fn vertex_style(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Person => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#e1d5e7;strokeColor=#9673a6;"
        }
        ElementKind::System => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#dae8fc;strokeColor=#6c8ebf;"
        }
        ElementKind::ExternalSystem => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#f5f5f5;strokeColor=#666666;dashed=1;"
        }
        ElementKind::Container => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#d5e8d4;strokeColor=#82b366;"
        }
        ElementKind::Component => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#fff2cc;strokeColor=#d6b656;"
        }
        ElementKind::Shadow => {
            "rounded=1;whiteSpace=wrap;html=1;verticalAlign=top;align=center;spacingTop=8;fillColor=#ffffff;strokeColor=#000000;"
        }
    }
}

/// The edge style for a relationship's line style and arrowheads.
fn edge_style(relationship: &Relationship) -> String {
    let dash = match relationship.line_style {
        LineStyle::Solid => "",
        LineStyle::Dashed => "dashed=1;dashPattern=8 8;",
        LineStyle::Dotted => "dashed=1;dashPattern=2 2;",
    };
    let arrows = match relationship.arrow_direction {
        ArrowDirection::Left => "startArrow=classic;endArrow=none;",
        ArrowDirection::Both => "startArrow=classic;endArrow=classic;",
        ArrowDirection::Right | ArrowDirection::None => "startArrow=none;endArrow=classic;",
    };
    format!(
        "edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;{dash}{arrows}strokeColor=#666666;"
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;
    use crate::domain::Position;

    fn element(kind: ElementKind, id: &str, name: &str, x: f64, y: f64) -> Element {
        let mut element = Element::new(id, kind);
        element.name = name.to_string();
        element.position = Position::new(x, y);
        element
    }

    fn render(model: &Model) -> String {
        let at = Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .unwrap();
        Drawio::at(model, at).to_string()
    }

    #[test_case(LineStyle::Solid, ArrowDirection::Right => "startArrow=none;endArrow=classic;"; "solid right")]
    #[test_case(LineStyle::Dashed, ArrowDirection::Left => "dashed=1;dashPattern=8 8;startArrow=classic;endArrow=none;"; "dashed left")]
    #[test_case(LineStyle::Dotted, ArrowDirection::Both => "dashed=1;dashPattern=2 2;startArrow=classic;endArrow=classic;"; "dotted both")]
    #[test_case(LineStyle::Solid, ArrowDirection::None => "startArrow=none;endArrow=classic;"; "no arrows falls back to right")]
    fn edge_style_follows_presentation(line_style: LineStyle, arrow_direction: ArrowDirection) -> String {
        let mut relationship = Relationship::new("rel-1", "a", "b");
        relationship.line_style = line_style;
        relationship.arrow_direction = arrow_direction;
        let style = edge_style(&relationship);

        let prefix = "edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;";
        let suffix = "strokeColor=#666666;";
        assert!(style.starts_with(prefix));
        assert!(style.ends_with(suffix));
        style[prefix.len()..style.len() - suffix.len()].to_string()
    }

    #[test]
    fn document_carries_vertices_and_edges() {
        let mut model = Model::default();
        model.metadata.name = "Shop".to_string();
        model
            .people
            .push(element(ElementKind::Person, "p-1", "Customer", 0.0, 10.0));
        let mut store = element(ElementKind::System, "s-1", "Store", 300.0, 200.0);
        store.technology = "Rust".to_string();
        store.description = "Sells things".to_string();
        model.systems.push(store);
        let mut rel = Relationship::new("r-1", "p-1", "s-1");
        rel.description = "Buys from".to_string();
        rel.line_style = LineStyle::Dashed;
        model.relationships.push(rel);

        let xml = render(&model);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("modified=\"2023-11-14T22:13:20.000Z\""));
        assert!(xml.contains("<diagram name=\"Shop\" id=\"diagram-1700000000000\">"));
        assert!(xml.contains("<mxCell id=\"0\"/>"));
        assert!(xml.contains("<mxCell id=\"1\" parent=\"0\"/>"));

        // people first, shifted right by the margin and down to it
        assert!(xml.contains("<mxCell id=\"cell-2\" value=\"&lt;b&gt;Customer&lt;/b&gt;"));
        assert!(xml.contains("x=\"50\" y=\"50\" width=\"220\" height=\"120\""));
        assert!(xml.contains("x=\"350\" y=\"240\""));
        assert!(xml.contains("[Software System]&lt;br&gt;[Rust]&lt;/font&gt;"));
        assert!(xml.contains("fillColor=#dae8fc;strokeColor=#6c8ebf;"));

        assert!(xml.contains("<mxCell id=\"edge-4\" value=\"Buys from\""));
        assert!(xml.contains("dashed=1;dashPattern=8 8;startArrow=none;endArrow=classic;"));
        assert!(xml.contains("source=\"cell-2\" target=\"cell-3\""));
        assert!(xml.trim_end().ends_with("</mxfile>"));
    }

    #[test]
    fn dangling_edges_and_shadows_are_skipped() {
        let mut model = Model::default();
        model
            .systems
            .push(element(ElementKind::System, "s-1", "Store", 100.0, 100.0));
        model
            .shadows
            .push(element(ElementKind::Shadow, "sh-1", "Mirror", 0.0, 0.0));
        model
            .relationships
            .push(Relationship::new("r-1", "s-1", "sh-1"));
        model
            .relationships
            .push(Relationship::new("r-2", "s-1", "s-1"));

        let xml = render(&model);

        assert!(!xml.contains("Mirror"));
        assert!(!xml.contains("edge-3"));
        assert!(xml.contains("<mxCell id=\"edge-4\""));
    }

    #[test]
    fn text_is_escaped() {
        let mut model = Model::default();
        model.metadata.name = String::new();
        let mut system = element(ElementKind::System, "s-1", "R&D <core>", 100.0, 100.0);
        system.description = "say \"hi\"".to_string();
        model.systems.push(system);

        let xml = render(&model);

        assert!(xml.contains("<diagram name=\"C4 Diagram\""));
        assert!(xml.contains("&lt;b&gt;R&amp;amp;D &amp;lt;core&amp;gt;&lt;/b&gt;"));
        assert!(!xml.contains("say \"hi\""));
    }

    #[test]
    fn page_grows_with_the_diagram() {
        let far = element(ElementKind::System, "s-1", "Far", 2000.0, 60.0);
        let page = Page::fit(&[&far]);
        assert!(page.offset_x.abs() < f64::EPSILON);
        assert!((page.width - 2320.0).abs() < f64::EPSILON);
        assert!((page.height - MIN_PAGE_HEIGHT).abs() < f64::EPSILON);

        let empty = Page::fit(&[]);
        assert!((empty.width - MIN_PAGE_WIDTH).abs() < f64::EPSILON);
    }
}
