use std::fs;
use std::path::Path;

use dxfcheck_core::{
    document::{Document, Entity, OtherEntity, Polyline, Text},
    geometry::{Bounds2D, Point2},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

const BINARY_DXF_SENTINEL: &str = "AutoCAD Binary DXF";

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

/// ASCII DXF 读取入口。只解析校验需要的段：HEADER、TABLES、ENTITIES。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 直接从内存中的 DXF 文本构建文档。
    pub fn parse_str(&self, source: &str) -> Result<Document, IoError> {
        let parsed = if source.starts_with(BINARY_DXF_SENTINEL) {
            Err(DxfError::unsupported("二进制 DXF"))
        } else {
            DxfParser::new(source).parse()
        };
        parsed.map_err(|err| match err {
            DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
            DxfError::Invalid { message } => IoError::InvalidDocument(message),
        })
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        // 旧版 DXF 常用本地代码页，非 UTF-8 字节按替换字符处理。
        let data = String::from_utf8_lossy(&bytes);
        self.parse_str(&data)
    }
}

#[derive(Debug)]
enum DxfError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl DxfError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// 解析出的实体及其所在空间（组码 67 为 1 表示图纸空间）。
struct ParsedEntity {
    entity: Entity,
    paper_space: bool,
}

impl ParsedEntity {
    fn new(entity: Entity, paper_space: bool) -> Self {
        Self {
            entity,
            paper_space,
        }
    }

    /// 模型空间实体进入文档；图纸空间实体只登记图层并计数。
    fn store(self, document: &mut Document) {
        if self.paper_space {
            document.note_paper_space_entity(self.entity.layer_name());
        } else {
            document.add_entity(self.entity);
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

/// 头部变量 `$EXTMIN` / `$EXTMAX` 的坐标槽位。
#[derive(Default)]
struct ExtentSlots {
    min_x: Option<f64>,
    min_y: Option<f64>,
    max_x: Option<f64>,
    max_y: Option<f64>,
}

impl ExtentSlots {
    fn finish(self) -> Option<Bounds2D> {
        match (self.min_x, self.min_y, self.max_x, self.max_y) {
            (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) => Some(Bounds2D::new(
                Point2::new(min_x, min_y),
                Point2::new(max_x, max_y),
            )),
            _ => None,
        }
    }
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code == 999 {
                continue; // 注释
            }
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "HEADER" => self.parse_header(&mut document)?,
                        "TABLES" => self.parse_tables(&mut document)?,
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_header(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut variable: Option<String> = None;
        let mut slots = ExtentSlots::default();
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("HEADER 段提前结束")),
            };
            match code {
                0 if value.trim() == "ENDSEC" => break,
                9 => variable = Some(value.trim().to_string()),
                10 | 20 => {
                    let slot = match (variable.as_deref(), code) {
                        (Some("$EXTMIN"), 10) => &mut slots.min_x,
                        (Some("$EXTMIN"), 20) => &mut slots.min_y,
                        (Some("$EXTMAX"), 10) => &mut slots.max_x,
                        (Some("$EXTMAX"), 20) => &mut slots.max_y,
                        _ => continue,
                    };
                    assign_coord(slot, &value, "HEADER 图纸范围坐标")?;
                }
                _ => {}
            }
        }

        if let Some(extents) = slots.finish() {
            // 空图纸的默认范围为 (1e20, -1e20)，视为未声明。
            if !extents.is_empty() {
                document.set_extents(extents);
            }
        }
        Ok(())
    }

    fn parse_tables(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("TABLES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "TABLES 段遇到组码 {code}（期望 0 表示表起始）"
                )));
            }
            match value.trim() {
                "ENDSEC" => break,
                "TABLE" => self.parse_table(document)?,
                _ => self.skip_entity_body()?,
            }
        }
        Ok(())
    }

    fn parse_table(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut table_name: Option<String> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((2, value)) => table_name = Some(value.trim().to_string()),
                Some(_) => {}
                None => return Err(DxfError::invalid("TABLE 未正确结束")),
            }
        }

        let is_layer_table = table_name.as_deref() == Some("LAYER");
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("TABLE 未找到 ENDTAB 终止标记")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "TABLE 内遇到组码 {code}（期望 0 表示记录起始）"
                )));
            }
            match value.trim() {
                "ENDTAB" => break,
                "LAYER" if is_layer_table => {
                    if let Some(name) = self.parse_layer_record()? {
                        document.ensure_layer(name);
                    }
                }
                _ => self.skip_entity_body()?,
            }
        }
        Ok(())
    }

    fn parse_layer_record(&mut self) -> Result<Option<String>, DxfError> {
        let mut name = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((2, value)) => name = Some(value.trim().to_string()),
                Some(_) => {}
                None => return Err(DxfError::invalid("LAYER 记录未正确结束")),
            }
        }
        Ok(name.filter(|name| !name.is_empty()))
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                "SEQEND" | "VERTEX" => {
                    // 脱离 POLYLINE 的序列记录，直接跳过
                    self.skip_entity_body()?;
                }
                "TEXT" => {
                    let parsed = self.parse_text()?;
                    parsed.store(document);
                }
                "LWPOLYLINE" => {
                    let parsed = self.parse_lwpolyline()?;
                    parsed.store(document);
                }
                "POLYLINE" => {
                    let parsed = self.parse_polyline()?;
                    parsed.store(document);
                }
                other => {
                    let parsed = self.parse_other(other)?;
                    parsed.store(document);
                }
            }
        }
        Ok(())
    }

    fn parse_other(&mut self, kind: &str) -> Result<ParsedEntity, DxfError> {
        let mut layer = None;
        let mut paper_space = false;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((8, value)) => layer = Some(value.trim().to_string()),
                Some((67, value)) => paper_space = parse_space_flag(&value)?,
                Some(_) => {}
                None => return Err(DxfError::invalid(format!("{kind} 未正确结束"))),
            }
        }
        Ok(ParsedEntity::new(
            Entity::Other(OtherEntity {
                kind: kind.to_string(),
                layer: layer.unwrap_or_else(|| "0".to_string()),
            }),
            paper_space,
        ))
    }

    fn parse_lwpolyline(&mut self) -> Result<ParsedEntity, DxfError> {
        let mut layer = None;
        let mut paper_space = false;
        let mut is_closed = false;
        let mut vertices: Vec<Point2> = Vec::new();
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    67 => paper_space = parse_space_flag(&value)?,
                    70 => {
                        let flag = parse_i32(&value, "LWPOLYLINE 标志")?;
                        is_closed = flag & 0x01 == 0x01;
                    }
                    10 => {
                        let x = parse_f64(&value, "LWPOLYLINE 顶点 X")?;
                        if let Some(y) = pending_y.take() {
                            vertices.push(Point2::new(x, y));
                        } else if pending_x.replace(x).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 Y（组码 20）",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "LWPOLYLINE 顶点 Y")?;
                        if let Some(x) = pending_x.take() {
                            vertices.push(Point2::new(x, y));
                        } else if pending_y.replace(y).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 X（组码 10）",
                            ));
                        }
                    }
                    // 90 顶点数、42 bulge、40/41 宽度：校验不使用
                    _ => {}
                },
                None => return Err(DxfError::invalid("LWPOLYLINE 未正确结束")),
            }
        }

        if pending_x.is_some() || pending_y.is_some() {
            return Err(DxfError::invalid(
                "LWPOLYLINE 顶点坐标成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        Ok(ParsedEntity::new(
            Entity::LwPolyline(Polyline {
                vertices,
                is_closed,
                layer,
            }),
            paper_space,
        ))
    }

    /// 旧式 POLYLINE：头部之后跟随若干 VERTEX，以 SEQEND 结束。
    fn parse_polyline(&mut self) -> Result<ParsedEntity, DxfError> {
        let mut layer = None;
        let mut paper_space = false;
        let mut flags: i16 = 0;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    67 => paper_space = parse_space_flag(&value)?,
                    70 => flags = parse_i16(&value, "POLYLINE 标志（组码 70）")?,
                    _ => {}
                },
                None => return Err(DxfError::invalid("POLYLINE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        if flags & (0x10 | 0x40) != 0 {
            // 网格与多面网格不构成平面区域，只计数。
            self.skip_polyline_sequence()?;
            return Ok(ParsedEntity::new(
                Entity::Other(OtherEntity {
                    kind: "POLYLINE".to_string(),
                    layer,
                }),
                paper_space,
            ));
        }

        let mut vertices = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => {
                        if let Some(vertex) = self.parse_vertex()? {
                            vertices.push(vertex);
                        }
                    }
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => continue,
                None => return Err(DxfError::invalid("POLYLINE 缺少 SEQEND")),
            }
        }

        Ok(ParsedEntity::new(
            Entity::Polyline(Polyline {
                vertices,
                is_closed: flags & 0x01 == 0x01,
                layer,
            }),
            paper_space,
        ))
    }

    fn parse_vertex(&mut self) -> Result<Option<Point2>, DxfError> {
        let mut x = None;
        let mut y = None;
        let mut flags: i16 = 0;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => assign_coord(&mut x, &value, "VERTEX X（组码 10）")?,
                    20 => assign_coord(&mut y, &value, "VERTEX Y（组码 20）")?,
                    70 => flags = parse_i16(&value, "VERTEX 标志（组码 70）")?,
                    _ => {}
                },
                None => return Err(DxfError::invalid("VERTEX 未正确结束")),
            }
        }

        // 样条拟合的控制点（标志 16）不属于多段线本身的顶点。
        if flags & 0x10 != 0 {
            return Ok(None);
        }
        let x = x.ok_or_else(|| DxfError::invalid("VERTEX 缺少 X（组码 10）"))?;
        let y = y.ok_or_else(|| DxfError::invalid("VERTEX 缺少 Y（组码 20）"))?;
        Ok(Some(Point2::new(x, y)))
    }

    fn skip_polyline_sequence(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => self.skip_entity_body()?,
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }

    fn parse_text(&mut self) -> Result<ParsedEntity, DxfError> {
        let mut layer = None;
        let mut paper_space = false;
        let mut insert_x = None;
        let mut insert_y = None;
        let mut text: Option<String> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    67 => paper_space = parse_space_flag(&value)?,
                    10 => {
                        if insert_x.is_some() {
                            return Err(DxfError::invalid("TEXT 遇到重复的插入点 X（组码 10）"));
                        }
                        insert_x = Some(parse_f64(&value, "TEXT 插入点 X")?);
                    }
                    20 => {
                        if insert_y.is_some() {
                            return Err(DxfError::invalid("TEXT 遇到重复的插入点 Y（组码 20）"));
                        }
                        insert_y = Some(parse_f64(&value, "TEXT 插入点 Y")?);
                    }
                    1 => {
                        let entry = value;
                        match text {
                            Some(ref mut existing) => {
                                existing.push('\n');
                                existing.push_str(&entry);
                            }
                            None => text = Some(entry),
                        }
                    }
                    // 目前忽略：高度、旋转、样式、对齐信息等
                    _ => {}
                },
                None => return Err(DxfError::invalid("TEXT 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let ix = insert_x.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 X（组码 10）"))?;
        let iy = insert_y.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 Y（组码 20）"))?;
        // 缺少组码 1 时按空字符串处理。
        let content = text.unwrap_or_default();

        Ok(ParsedEntity::new(
            Entity::Text(Text {
                insert: Point2::new(ix, iy),
                content,
                layer,
            }),
            paper_space,
        ))
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    // 文件末尾的空行不构成组码
                    if line.trim().is_empty() {
                        continue;
                    }
                    break line;
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        if self.buffer.is_some() {
            panic!("内部错误：尝试多次回退 DXF pair");
        }
        self.buffer = Some(pair);
    }
}

fn parse_space_flag(raw: &str) -> Result<bool, DxfError> {
    Ok(parse_i16(raw, "空间标志（组码 67）")? == 1)
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let value = parse_i32(raw, context)?;
    i16::try_from(value)
        .map_err(|_| DxfError::invalid(format!("{context} 超出 i16 范围（值：{value}）")))
}
