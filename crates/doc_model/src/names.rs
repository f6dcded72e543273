//! Qualified WordprocessingML names
//!
//! Parts are kept with the prefixes their producer wrote. Every OOXML producer
//! binds the fixed prefixes below to their namespaces, so names are compared
//! as qualified strings.

/// XML namespaces used by the engine
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Markup compatibility namespace
    pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
    /// Word 2010 extensions
    pub const W14: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
}

// Block level
pub const BODY: &str = "w:body";
pub const P: &str = "w:p";
pub const P_PR: &str = "w:pPr";
pub const P_STYLE: &str = "w:pStyle";
pub const SECT_PR: &str = "w:sectPr";
pub const TBL: &str = "w:tbl";
pub const TBL_PR: &str = "w:tblPr";
pub const TBL_GRID: &str = "w:tblGrid";
pub const GRID_COL: &str = "w:gridCol";
pub const TBL_STYLE: &str = "w:tblStyle";
pub const TBL_W: &str = "w:tblW";
pub const TBL_LOOK: &str = "w:tblLook";
pub const TR: &str = "w:tr";
pub const TR_PR: &str = "w:trPr";
pub const TC: &str = "w:tc";
pub const TC_PR: &str = "w:tcPr";
pub const TC_W: &str = "w:tcW";
pub const GRID_SPAN: &str = "w:gridSpan";

// Run level
pub const R: &str = "w:r";
pub const R_PR: &str = "w:rPr";
pub const R_STYLE: &str = "w:rStyle";
pub const T: &str = "w:t";
pub const TAB: &str = "w:tab";
pub const PTAB: &str = "w:ptab";
pub const BR: &str = "w:br";
pub const CR: &str = "w:cr";
pub const NO_BREAK_HYPHEN: &str = "w:noBreakHyphen";
pub const SYM: &str = "w:sym";
pub const DEL_TEXT: &str = "w:delText";
pub const INSTR_TEXT: &str = "w:instrText";
pub const FLD_CHAR: &str = "w:fldChar";
pub const DRAWING: &str = "w:drawing";
pub const PICT: &str = "w:pict";
pub const OBJECT: &str = "w:object";
pub const TXBX_CONTENT: &str = "w:txbxContent";

// Run properties
pub const B: &str = "w:b";
pub const I: &str = "w:i";
pub const CAPS: &str = "w:caps";
pub const SMALL_CAPS: &str = "w:smallCaps";
pub const STRIKE: &str = "w:strike";
pub const DSTRIKE: &str = "w:dstrike";
pub const VANISH: &str = "w:vanish";
pub const U: &str = "w:u";
pub const SZ: &str = "w:sz";
pub const SZ_CS: &str = "w:szCs";
pub const R_FONTS: &str = "w:rFonts";
pub const COLOR: &str = "w:color";
pub const HIGHLIGHT: &str = "w:highlight";
pub const VERT_ALIGN: &str = "w:vertAlign";
pub const SPACING: &str = "w:spacing";
pub const LANG: &str = "w:lang";

// Run containers and revisions
pub const HYPERLINK: &str = "w:hyperlink";
pub const SMART_TAG: &str = "w:smartTag";
pub const FLD_SIMPLE: &str = "w:fldSimple";
pub const CUSTOM_XML: &str = "w:customXml";
pub const SDT: &str = "w:sdt";
pub const SDT_PR: &str = "w:sdtPr";
pub const SDT_END_PR: &str = "w:sdtEndPr";
pub const SDT_CONTENT: &str = "w:sdtContent";
pub const DOC_PART_OBJ: &str = "w:docPartObj";
pub const DOC_PART_GALLERY: &str = "w:docPartGallery";
pub const INS: &str = "w:ins";
pub const DEL: &str = "w:del";
pub const MOVE_FROM: &str = "w:moveFrom";
pub const MOVE_TO: &str = "w:moveTo";

// Markers
pub const BOOKMARK_START: &str = "w:bookmarkStart";
pub const BOOKMARK_END: &str = "w:bookmarkEnd";

// Numbering
pub const NUM_PR: &str = "w:numPr";
pub const NUM_ID: &str = "w:numId";
pub const ILVL: &str = "w:ilvl";
pub const NUMBERING: &str = "w:numbering";
pub const ABSTRACT_NUM: &str = "w:abstractNum";
pub const ABSTRACT_NUM_ID: &str = "w:abstractNumId";
pub const NUM: &str = "w:num";
pub const LVL: &str = "w:lvl";
pub const START: &str = "w:start";
pub const NUM_FMT: &str = "w:numFmt";
pub const LVL_TEXT: &str = "w:lvlText";
pub const LVL_JC: &str = "w:lvlJc";
pub const IND: &str = "w:ind";
pub const MULTI_LEVEL_TYPE: &str = "w:multiLevelType";

// Parts
pub const DOCUMENT: &str = "w:document";
pub const HDR: &str = "w:hdr";
pub const FTR: &str = "w:ftr";
pub const FOOTNOTES: &str = "w:footnotes";
pub const ENDNOTES: &str = "w:endnotes";
pub const FOOTNOTE: &str = "w:footnote";
pub const ENDNOTE: &str = "w:endnote";
pub const FOOTNOTE_REFERENCE: &str = "w:footnoteReference";
pub const ENDNOTE_REFERENCE: &str = "w:endnoteReference";
pub const FOOTNOTE_REF: &str = "w:footnoteRef";
pub const ENDNOTE_REF: &str = "w:endnoteRef";
pub const HEADER_REFERENCE: &str = "w:headerReference";
pub const FOOTER_REFERENCE: &str = "w:footerReference";
pub const TITLE_PG: &str = "w:titlePg";
pub const TYPE: &str = "w:type";

// Markup compatibility
pub const MC_ALTERNATE_CONTENT: &str = "mc:AlternateContent";
pub const MC_CHOICE: &str = "mc:Choice";
pub const MC_FALLBACK: &str = "mc:Fallback";

// Attributes
pub const ATTR_VAL: &str = "w:val";
pub const ATTR_ID: &str = "w:id";
pub const ATTR_NAME: &str = "w:name";
pub const ATTR_AUTHOR: &str = "w:author";
pub const ATTR_DATE: &str = "w:date";
pub const ATTR_TYPE: &str = "w:type";
pub const ATTR_CHAR: &str = "w:char";
pub const ATTR_W: &str = "w:w";
pub const ATTR_R_ID: &str = "r:id";
pub const ATTR_XML_SPACE: &str = "xml:space";
pub const ATTR_PARA_ID: &str = "w14:paraId";
pub const ATTR_TEXT_ID: &str = "w14:textId";
pub const ATTR_ASCII: &str = "w:ascii";
pub const ATTR_H_ANSI: &str = "w:hAnsi";
pub const ATTR_CS: &str = "w:cs";

/// Local part of a qualified name (`w:p` → `p`)
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit_once(':').map(|(_, local)| local).unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(P), "p");
        assert_eq!(local_name("Relationship"), "Relationship");
        assert_eq!(local_name(MC_FALLBACK), "Fallback");
    }
}
