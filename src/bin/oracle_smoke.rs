use std::env;

use chrono::Utc;
use oracle_node::{
    build_bulk_update_sql, client, executor, CacheKey, ClientPathType, DatabaseType, QueryOptions,
    Record, SourceOptions,
};

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize: {}", e),
    }
}

fn usage() {
    eprintln!(
        "Oracle Node Smoke CLI\n\n\
        Commands:\n\
          ready [--path <dir>]                  Check Instant Client detection\n\
          prime [--path <dir>]                  Load the Instant Client library\n\
          test-conn --host <host> --port <port> --database <db> \\\n\
                    --user <user> --pass <pass> [--sid] [--ssl] [--path <dir>]\n\
                                                Probe connectivity (uncached)\n\
          query     (same connection flags) --sql <text>\n\
                                                Run SQL and print the result\n\
          bulk-sql  --table <t> --pk <col> --records <json-array>\n\
                                                Print the synthesized bulk-update text\n\
        "
    );
}

fn parse_flag(args: &[String], name: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(tok) = it.next() {
        if tok == name {
            return it.next().cloned();
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|tok| tok == name)
}

fn require_flag(args: &[String], name: &str) -> Result<String, i32> {
    parse_flag(args, name).ok_or_else(|| {
        eprintln!("Missing {}", name);
        4
    })
}

fn source_from_flags(args: &[String]) -> Result<SourceOptions, i32> {
    let host = require_flag(args, "--host")?;
    let port = require_flag(args, "--port")?.parse::<u16>().map_err(|_| {
        eprintln!("Invalid --port");
        4
    })?;
    let database = require_flag(args, "--database")?;
    let username = require_flag(args, "--user")?;
    let password = require_flag(args, "--pass")?;
    let path = parse_flag(args, "--path");

    Ok(SourceOptions {
        host,
        port,
        username,
        password,
        database,
        database_type: if has_flag(args, "--sid") {
            DatabaseType::Sid
        } else {
            DatabaseType::ServiceName
        },
        ssl_enabled: has_flag(args, "--ssl"),
        client_path_type: if path.is_some() {
            ClientPathType::Custom
        } else {
            ClientPathType::Default
        },
        path,
    })
}

fn cmd_ready(args: &[String]) -> i32 {
    print_json(&client::detect_client(parse_flag(args, "--path").as_deref()));
    0
}

fn cmd_prime(args: &[String]) -> i32 {
    match client::prime(parse_flag(args, "--path").as_deref()) {
        Ok(()) => {
            println!("Primed Oracle client environment");
            0
        }
        Err(e) => {
            eprintln!("Prime failed: {}", e);
            1
        }
    }
}

fn cmd_test_conn(args: &[String]) -> i32 {
    let source = match source_from_flags(args) {
        Ok(s) => s,
        Err(code) => return code,
    };
    print_json(&executor::test_connection_to_result(&source));
    0
}

fn cmd_query(args: &[String]) -> i32 {
    let source = match source_from_flags(args) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sql = match require_flag(args, "--sql") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let key = CacheKey {
        data_source_id: "smoke".to_string(),
        updated_at: Utc::now(),
    };
    let options = QueryOptions::Raw { query: sql };
    print_json(&executor::run_to_result(&source, &options, &key));
    0
}

fn cmd_bulk_sql(args: &[String]) -> i32 {
    let table = match require_flag(args, "--table") {
        Ok(v) => v,
        Err(code) => return code,
    };
    let pk = match require_flag(args, "--pk") {
        Ok(v) => v,
        Err(code) => return code,
    };
    let raw = match require_flag(args, "--records") {
        Ok(v) => v,
        Err(code) => return code,
    };
    let records: Vec<Record> = match serde_json::from_str(&raw) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("--records must be a JSON array of objects: {}", e);
            return 4;
        }
    };
    println!("{}", build_bulk_update_sql(&table, &pk, &records));
    0
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let rest = args[2..].to_vec();
    let code = match args[1].as_str() {
        "ready" => cmd_ready(&rest),
        "prime" => cmd_prime(&rest),
        "test-conn" => cmd_test_conn(&rest),
        "query" => cmd_query(&rest),
        "bulk-sql" => cmd_bulk_sql(&rest),
        _ => {
            usage();
            1
        }
    };

    std::process::exit(code);
}
