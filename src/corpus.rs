use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::errors::{Error, Result};

/// Name of the token attribute holding the part-of-speech tag.
pub const POS: &str = "pos";

const DOCUMENT: &[u8] = b"document";
const PARAGRAPH: &[u8] = b"p";
const SENTENCE: &[u8] = b"s";
const WORD: &[u8] = b"w";

/// A word of a sentence: its surface form plus named attributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
}

impl Token {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), attrs: BTreeMap::new() }
    }

    pub fn with_pos(name: &str, pos: &str) -> Self {
        let mut token = Self::new(name);
        token.set_attr(POS, pos);
        token
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        self.attrs.insert(key.to_string(), value.to_string());
    }

    pub fn pos(&self) -> Option<&str> {
        self.attr(POS)
    }
}

pub type Sentence = Vec<Token>;
pub type Paragraph = Vec<Sentence>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl From<Vec<Paragraph>> for Document {
    fn from(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }
}

impl Document {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Self::read(BufReader::new(f))
    }

    /// Parses `<document><p><s><w pos="..">word</w>..</s></p></document>`.
    pub fn read<R: BufRead>(rdr: R) -> Result<Self> {
        let mut rdr = Reader::from_reader(rdr);
        rdr.trim_text(true);
        let mut buf = vec![];
        let mut doc = Document::default();
        let mut paragraph: Option<Paragraph> = None;
        let mut sentence: Option<Sentence> = None;
        let mut token: Option<Token> = None;
        loop {
            buf.clear();
            match rdr.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    PARAGRAPH => {
                        flush_paragraph(&mut doc, &mut paragraph);
                        paragraph = Some(Paragraph::new());
                    }
                    SENTENCE => sentence = Some(Sentence::new()),
                    WORD => token = Some(read_token(&e)?),
                    DOCUMENT => {}
                    name => log::debug!("skip element <{}>", String::from_utf8_lossy(name)),
                },
                Event::Empty(e) if e.name().as_ref() == WORD => {
                    push_token(&mut sentence, read_token(&e)?)?;
                }
                Event::Empty(e) if e.name().as_ref() == SENTENCE => {
                    paragraph.get_or_insert_with(Paragraph::new).push(Sentence::new());
                }
                Event::Text(e) => {
                    if let Some(token) = token.as_mut() {
                        token.name.push_str(e.unescape()?.as_ref());
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    WORD => {
                        if let Some(t) = token.take() {
                            push_token(&mut sentence, t)?;
                        }
                    }
                    SENTENCE => {
                        if let Some(s) = sentence.take() {
                            paragraph.get_or_insert_with(Paragraph::new).push(s);
                        }
                    }
                    PARAGRAPH => flush_paragraph(&mut doc, &mut paragraph),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        if token.is_some() || sentence.is_some() {
            return Err(Error::Corpus("unexpected end of document".into()));
        }
        flush_paragraph(&mut doc, &mut paragraph);
        Ok(doc)
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        std::fs::write(path, buf)?;
        Ok(())
    }

    pub fn write<W: Write>(&self, w: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(w, b' ', 2);
        writer.write_event(Event::Start(BytesStart::new("document")))?;
        for paragraph in &self.paragraphs {
            writer.write_event(Event::Start(BytesStart::new("p")))?;
            for sentence in paragraph {
                writer.write_event(Event::Start(BytesStart::new("s")))?;
                for token in sentence {
                    let mut elem = BytesStart::new("w");
                    for (k, v) in &token.attrs {
                        elem.push_attribute((k.as_str(), v.as_str()));
                    }
                    writer.write_event(Event::Start(elem))?;
                    writer.write_event(Event::Text(BytesText::new(&token.name)))?;
                    writer.write_event(Event::End(BytesEnd::new("w")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("s")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("p")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("document")))?;
        writer.into_inner().write_all(b"\n")?;
        Ok(())
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.paragraphs.iter().flatten()
    }

    pub fn sentences_mut(&mut self) -> impl Iterator<Item = &mut Sentence> {
        self.paragraphs.iter_mut().flatten()
    }

    pub fn num_sentences(&self) -> usize {
        self.paragraphs.iter().map(Vec::len).sum()
    }

    pub fn num_tokens(&self) -> usize {
        self.sentences().map(Vec::len).sum()
    }
}

fn read_token(e: &BytesStart) -> Result<Token> {
    let mut token = Token::default();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        token.attrs.insert(key, value);
    }
    Ok(token)
}

fn push_token(sentence: &mut Option<Sentence>, token: Token) -> Result<()> {
    match sentence {
        Some(s) => {
            s.push(token);
            Ok(())
        }
        None => Err(Error::Corpus(format!("word `{}` outside of a sentence", token.name))),
    }
}

fn flush_paragraph(doc: &mut Document, paragraph: &mut Option<Paragraph>) {
    if let Some(p) = paragraph.take() {
        doc.paragraphs.push(p);
    }
}
