
/* Copyright (C) 2024 Philipp Benner
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::fmt::Display;

use log::{debug, error, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/* -------------------------------------------------------------------------- */

pub const BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Downloadable {
    pub description: String,
    pub file_type  : String,
    pub file_url   : String,
}

/* -------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(rename = "IdList", default)]
    id_list: IdList,
}

#[derive(Debug, Default, Deserialize)]
struct IdList {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

fn xml_error<E: Display>(e: E) -> Error {
    Error::MetadataParse(e.to_string())
}

/// Extracts the first dataset id from an `esearch` response. Unlike
/// [`parse_downloadables`], malformed XML is an error here.
pub fn parse_esearch(content: &str) -> Result<Option<String>> {
    let result: ESearchResult = quick_xml::de::from_str(content).map_err(xml_error)?;
    Ok(result.id_list.ids.into_iter().map(|id| id.trim().to_string()).find(|id| !id.is_empty()))
}

/* -------------------------------------------------------------------------- */

fn item_name(e: &BytesStart) -> Result<Option<String>> {
    if e.name().as_ref() != b"Item" {
        return Ok(None);
    }
    let name = e.try_get_attribute("Name").map_err(xml_error)?;
    Ok(name.map(|attr| String::from_utf8_lossy(&attr.value).into_owned()))
}

fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "amp"  => Some("&".to_string()),
        "lt"   => Some("<".to_string()),
        "gt"   => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" => Some("'".to_string()),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            };
            code.and_then(char::from_u32).map(|c| c.to_string())
        }
    }
}

/// Collects description, file type and URL of every `Item` element named
/// `download`. Values are taken from the first descendant `Item` with the
/// respective name.
pub fn parse_download_items(content: &str) -> Result<Vec<Downloadable>> {

    let mut reader = Reader::from_str(content);

    // open elements, `Some(name)` for `Item` elements
    let mut stack  : Vec<Option<String>> = Vec::new();
    // depth and data of the enclosing download item
    let mut current: Option<(usize, Downloadable)> = None;
    let mut text   = String::new();
    let mut result = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = item_name(&e)?;
                if current.is_none() && name.as_deref() == Some("download") {
                    current = Some((stack.len(), Downloadable::default()));
                }
                stack.push(name);
                text.clear();
            }
            Event::Text(e) => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(&e);
                let value = resolve_entity(&name)
                    .ok_or_else(|| Error::MetadataParse(format!("unknown entity `&{};`", name)))?;
                text.push_str(&value);
            }
            Event::End(_) => {
                let name = stack.pop().flatten();
                let mut finished = false;

                if let Some((depth, item)) = current.as_mut() {
                    let value = text.trim();
                    match name.as_deref() {
                        Some("description") if item.description.is_empty() => item.description = value.to_string(),
                        Some("filetype")    if item.file_type  .is_empty() => item.file_type   = value.to_string(),
                        Some("url")         if item.file_url   .is_empty() => item.file_url    = value.to_string(),
                        _ => (),
                    }
                    finished = stack.len() == *depth;
                }
                if finished {
                    if let Some((_, item)) = current.take() {
                        result.push(item);
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => (),
        }
    }
    if !stack.is_empty() {
        return Err(Error::MetadataParse("unexpected end of document".to_string()));
    }
    Ok(result)
}

/// Finds the first line containing `FTP download:` and returns its last
/// word as link.
pub fn parse_ftp_line(content: &str) -> Option<Downloadable> {
    content
        .lines()
        .find(|line| line.contains("FTP download:"))
        .and_then(|line| line.split_whitespace().last())
        .map(|link| Downloadable {
            description: "FTP Download Link".to_string(),
            file_type  : "FTP".to_string(),
            file_url   : link.to_string(),
        })
}

/// Extracts downloadable files from an `efetch` response, which is either
/// XML or plain text. Malformed XML is logged and results in an empty list.
pub fn parse_downloadables(content: &str) -> Vec<Downloadable> {
    if content.trim_start().starts_with('<') {
        match parse_download_items(content) {
            Ok(items) => items,
            Err(err)  => {
                error!("Error parsing XML ({}). Response content:\n{}", err, content);
                Vec::new()
            }
        }
    } else {
        parse_ftp_line(content).into_iter().collect()
    }
}

/* -------------------------------------------------------------------------- */

/// Client for the NCBI E-utilities endpoints used to look up GEO samples.
pub struct GeoClient {
    client  : Client,
    base_url: String,
}

impl GeoClient {

    pub fn new() -> Self {
        GeoClient::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        GeoClient {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);
        let response = self.client
            .get(&url)
            .query(query)
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }

    /// Resolves a GSM accession to the internal GDS id. Fails with
    /// `MetadataParse` on a malformed response.
    pub fn fetch_gsm_details(&self, gsm_id: &str) -> Result<String> {
        let term    = format!("{}[ACCN]", gsm_id.trim());
        let content = self.get("esearch.fcgi", &[("db", "gds"), ("term", &term), ("retmax", "1")])?;

        match parse_esearch(&content)? {
            Some(id) => {
                info!("Accession {} resolved to GDS id {}", gsm_id, id);
                Ok(id)
            }
            None => Err(Error::Generic(format!("no GEO record found for accession `{}`", gsm_id))),
        }
    }

    pub fn fetch_downloadables(&self, gds_id: &str) -> Result<Vec<Downloadable>> {
        let content = self.get("efetch.fcgi", &[("db", "gds"), ("id", gds_id)])?;
        Ok(parse_downloadables(&content))
    }

    /// Both lookups in sequence.
    pub fn downloadables_for_sample(&self, gsm_id: &str) -> Result<Vec<Downloadable>> {
        let gds_id = self.fetch_gsm_details(gsm_id)?;
        self.fetch_downloadables(&gds_id)
    }

}

impl Default for GeoClient {
    fn default() -> Self {
        GeoClient::new()
    }
}
