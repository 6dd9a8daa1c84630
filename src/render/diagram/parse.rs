//! Flowchart source to graph.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::render::RenderError;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:graph|flowchart)(?:[ \t]+(TD|TB|BT|LR|RL))?$").expect("valid header regex")
});

/// Diagram kinds we recognise but do not render.
const OTHER_KINDS: &[&str] = &[
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "gantt",
    "pie",
    "journey",
    "gitGraph",
    "mindmap",
];

/// Statements that only carry styling or grouping, skipped by the renderer.
const IGNORED_KEYWORDS: &[&str] = &["classDef", "class", "style", "linkStyle", "click", "subgraph", "end"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    fn parse(s: &str) -> Self {
        match s {
            "BT" => Self::BottomUp,
            "LR" => Self::LeftRight,
            "RL" => Self::RightLeft,
            _ => Self::TopDown,
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    #[inline]
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    Round,
    Decision,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Arrow,
    Open,
    Thick,
    Dotted,
}

impl EdgeStyle {
    #[inline]
    pub fn has_head(self) -> bool {
        !matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub style: EdgeStyle,
}

#[derive(Debug, Default)]
pub struct Graph {
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    index: FxHashMap<String, usize>,
}

impl Graph {
    /// Insert or update a node, returning its index.
    ///
    /// A later explicit label/shape overrides the implicit one from a bare reference.
    fn node(&mut self, id: &str, decl: Option<(String, Shape)>) -> usize {
        if let Some(&i) = self.index.get(id) {
            if let Some((label, shape)) = decl {
                self.nodes[i].label = label;
                self.nodes[i].shape = shape;
            }
            return i;
        }
        let (label, shape) = decl.unwrap_or_else(|| (id.to_string(), Shape::Box));
        self.nodes.push(Node {
            id: id.to_string(),
            label,
            shape,
        });
        self.index.insert(id.to_string(), self.nodes.len() - 1);
        self.nodes.len() - 1
    }

    pub fn lookup(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }
}

/// Parse flowchart source.
pub fn parse(content: &str) -> Result<Graph, RenderError> {
    let mut statements = content
        .lines()
        .enumerate()
        .flat_map(|(i, line)| {
            let line = line.split("%%").next().unwrap_or("");
            line.split(';').map(move |s| (i + 1, s.trim()))
        })
        .filter(|(_, s)| !s.is_empty());

    let Some((line, header)) = statements.next() else {
        return Err(RenderError::Empty);
    };

    let Some(caps) = HEADER.captures(header) else {
        let kind = header.split_whitespace().next().unwrap_or(header);
        if OTHER_KINDS.contains(&kind) {
            return Err(RenderError::UnsupportedDiagram(kind.to_string()));
        }
        return Err(RenderError::Syntax {
            line,
            message: format!("expected `graph` or `flowchart` header, found `{header}`"),
        });
    };

    let mut graph = Graph {
        direction: caps.get(1).map(|m| Direction::parse(m.as_str())).unwrap_or_default(),
        ..Graph::default()
    };

    for (line, statement) in statements {
        let keyword = statement.split_whitespace().next().unwrap_or("");
        if IGNORED_KEYWORDS.contains(&keyword) {
            continue;
        }
        parse_statement(&mut graph, statement).map_err(|message| RenderError::Syntax { line, message })?;
    }

    Ok(graph)
}

/// Parse a chain `A[x] -->|l| B --> C(y)`.
fn parse_statement(graph: &mut Graph, statement: &str) -> Result<(), String> {
    let mut cursor = Cursor::new(statement);
    let mut pending: Option<(usize, EdgeStyle, Option<String>)> = None;

    loop {
        cursor.skip_ws();
        let id = cursor.ident().ok_or_else(|| format!("expected node id at `{}`", cursor.rest()))?;
        let decl = cursor.shape()?;
        let node = graph.node(id, decl);

        if let Some((from, style, label)) = pending.take() {
            graph.edges.push(Edge {
                from,
                to: node,
                label,
                style,
            });
        }

        cursor.skip_ws();
        if cursor.is_done() {
            return Ok(());
        }

        let style = cursor.arrow().ok_or_else(|| format!("expected arrow at `{}`", cursor.rest()))?;
        cursor.skip_ws();
        let label = cursor.edge_label()?;
        pending = Some((node, style, label));
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Optional shape right after a node id.
    fn shape(&mut self) -> Result<Option<(String, Shape)>, String> {
        let (close, shape) = if self.eat("((") {
            ("))", Shape::Circle)
        } else if self.eat("[") {
            ("]", Shape::Box)
        } else if self.eat("(") {
            (")", Shape::Round)
        } else if self.eat("{") {
            ("}", Shape::Decision)
        } else {
            return Ok(None);
        };

        let rest = self.rest();
        let end = rest.find(close).ok_or_else(|| format!("missing `{close}`"))?;
        self.pos += end + close.len();
        Ok(Some((unquote(&rest[..end]), shape)))
    }

    fn arrow(&mut self) -> Option<EdgeStyle> {
        [
            ("-.->", EdgeStyle::Dotted),
            ("-->", EdgeStyle::Arrow),
            ("==>", EdgeStyle::Thick),
            ("---", EdgeStyle::Open),
        ]
        .into_iter()
        .find_map(|(token, style)| self.eat(token).then_some(style))
    }

    fn edge_label(&mut self) -> Result<Option<String>, String> {
        if !self.eat("|") {
            return Ok(None);
        }
        let rest = self.rest();
        let end = rest.find('|').ok_or("missing closing `|` in edge label")?;
        self.pos += end + 1;
        Ok(Some(unquote(&rest[..end])))
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}
