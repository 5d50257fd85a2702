
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

use std::io::{self, BufRead, Write};
use std::process;

use clap::{Arg, ArgAction, Command};

use fastq2bigwig::error::Result;
use fastq2bigwig::geo::{Downloadable, GeoClient, BASE_URL};
use fastq2bigwig::infologger::Logger;

/* -------------------------------------------------------------------------- */

fn read_gsm() -> io::Result<String> {
    print!("Enter the GSM number: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_downloadables(downloadables: &[Downloadable]) {
    for item in downloadables {
        println!("Description: {}", item.description);
        println!("File Type: {}", item.file_type);
        println!("URL: {}", item.file_url);
        println!("{}", "-".repeat(50));
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let gsm_id = match matches.get_one::<String>("gsm") {
        Some(gsm_id) => gsm_id.clone(),
        None         => read_gsm()?,
    };
    let base_url = matches.get_one::<String>("base-url").map(String::as_str).unwrap_or(BASE_URL);

    let client        = GeoClient::with_base_url(base_url);
    let downloadables = client.downloadables_for_sample(&gsm_id)?;

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&downloadables)
            .map_err(|e| format!("serializing result failed: {}", e))?;
        println!("{}", json);
    } else {
        print_downloadables(&downloadables);
    }
    Ok(())
}

/* -------------------------------------------------------------------------- */

fn main() {
    let app = Command::new("geo-downloads")
        .version("1.0")
        .about("List downloadable files of a GEO sample")
        .arg(Arg::new("gsm")
            .help("GSM accession [read from standard input if missing]"))
        .arg(Arg::new("base-url")
            .long("base-url")
            .num_args(1)
            .help("Base URL of the E-utilities service"))
        .arg(Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print result as JSON"))
        .arg(Arg::new("verbose")
            .short('v')
            .action(ArgAction::Count)
            .help("Verbose level [-v or -vv]"));

    let matches = app.get_matches();

    Logger::init(matches.get_count("verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
