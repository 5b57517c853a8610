//! Client paging (`$top`, `$skip`), server paging, and next links.

use percent_encoding::percent_decode_str;
use query_engine_sql::sql::execution_plan::Paging;

use super::error::Error;

/// The page size used when none is configured.
pub const DEFAULT_SERVER_PAGE_SIZE: u32 = 1000;

const SKIP_TOKEN: &str = "$skiptoken";
const SKIP: &str = "$skip";

/// Work out the effective paging of a read.
/// Server paging applies when the client asks for no `top`, or for more than a page;
/// it then reads one page. A `page_size` of zero turns server paging off.
/// The skip token is the number of entities already delivered and adds to `skip`.
pub fn calculate_paging(
    top: Option<u32>,
    skip: Option<u32>,
    skip_token: Option<&str>,
    page_size: u32,
) -> Result<Paging, Error> {
    let skip_token = match skip_token {
        None => 0,
        Some(token) => token.trim().parse::<u32>().map_err(|_| {
            tracing::warn!("Cannot parse the skip token '{}'", token);
            Error::InvalidSkipToken(token.to_string())
        })?,
    };
    let skip = skip
        .unwrap_or(0)
        .checked_add(skip_token)
        .ok_or_else(|| Error::InvalidSkipToken(skip_token.to_string()))?;

    let server_side = page_size > 0 && top.map_or(true, |top| top > page_size);
    Ok(Paging {
        server_side,
        page_size,
        top: if server_side { Some(page_size) } else { top },
        skip,
    })
}

/// No paging at all, for reads addressing a single entity.
pub fn unpaged() -> Paging {
    Paging {
        server_side: false,
        page_size: 0,
        top: None,
        skip: 0,
    }
}

/// Whether a read returning `result_count` entities was cut short by server paging.
/// Never true for a short page.
pub fn needs_next_link(paging: &Paging, result_count: usize) -> bool {
    paging.server_side
        && usize::try_from(paging.page_size).map_or(false, |page_size| result_count == page_size)
}

/// The link to the following page: the request URL without its `$skip` and
/// `$skiptoken` options, with a `$skiptoken` counting every entity delivered so far.
pub fn next_link(request_url: &str, paging: &Paging) -> Result<String, Error> {
    let mut url = url::Url::parse(request_url)
        .map_err(|_| Error::InvalidNextLinkUrl(request_url.to_string()))?;
    let delivered = u64::from(paging.skip) + u64::from(paging.page_size);

    let mut pairs: Vec<&str> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            let name = percent_decode_str(name).decode_utf8_lossy();
            name != SKIP_TOKEN && name != SKIP
        })
        .collect();
    let skip_token = format!("{SKIP_TOKEN}={delivered}");
    pairs.push(&skip_token);
    let query = pairs.join("&");

    url.set_query(Some(&query));
    Ok(url.to_string())
}
