use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::error;
use std::env;
use std::path::PathBuf;

pub const DEV_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 5;

const PLACEHOLDER_USERNAME: &str = "placeholder_user";
const PLACEHOLDER_PASSWORD: &str = "placeholder_password";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub page_size: u32,
    pub rooms_path: Option<PathBuf>,
    pub dev: bool,
}

pub fn command() -> Command {
    Command::new("room-reviews")
        .version("0.1.0")
        .about("Browse room ratings and submit guest reviews")
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Base URL of the review service")
                .required(false),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("USERNAME")
                .help("Review service username")
                .required(false),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .help("Review service password")
                .required(false),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .value_name("SIZE")
                .help("Number of reviews per page")
                .required(false),
        )
        .arg(
            Arg::new("rooms")
                .long("rooms")
                .value_name("ROOMS_JSON")
                .help("Path to a JSON room catalog exported from the booking engine")
                .required(false),
        )
        .arg(
            Arg::new("dev")
                .long("dev")
                .help("Development mode: talk to a local review service")
                .action(ArgAction::SetTrue),
        )
}

impl Config {
    pub fn from_args_and_env(matches: &ArgMatches) -> Result<Self> {
        Self::from_args_and_lookup(matches, |key| env::var(key).ok())
    }

    /// Resolve every setting from its flag first, then from `lookup` (the environment).
    pub fn from_args_and_lookup<F>(matches: &ArgMatches, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |arg: &str, var: &str| {
            matches
                .get_one::<String>(arg)
                .cloned()
                .or_else(|| lookup(var))
                .filter(|v| !v.trim().is_empty())
        };

        let dev = matches.get_flag("dev")
            || lookup("REVIEWS_DEV").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let base_url = match value("base-url", "REVIEWS_API_BASE_URL") {
            Some(url) => url,
            None if dev => DEV_BASE_URL.to_string(),
            None => {
                return Err(anyhow!(
                    "Review service URL is required. Use --base-url or set REVIEWS_API_BASE_URL environment variable"
                ))
            }
        };

        let username = value("username", "REVIEWS_API_USERNAME").unwrap_or_else(|| {
            error!("REVIEWS_API_USERNAME is not set, using placeholder credentials");
            PLACEHOLDER_USERNAME.to_string()
        });

        let password = value("password", "REVIEWS_API_PASSWORD").unwrap_or_else(|| {
            error!("REVIEWS_API_PASSWORD is not set, using placeholder credentials");
            PLACEHOLDER_PASSWORD.to_string()
        });

        let page_size = match value("page-size", "REVIEWS_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => return Err(anyhow!("Page size must be a positive number, got {:?}", raw)),
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let rooms_path = value("rooms", "REVIEWS_ROOMS_FILE").map(PathBuf::from);

        Ok(Config {
            base_url,
            username,
            password,
            page_size,
            rooms_path,
            dev,
        })
    }
}
