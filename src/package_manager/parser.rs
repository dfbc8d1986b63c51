//! 输出解析函数

use super::types::{InstalledChannel, InstalledPackage};

/// `pear list` / `pear list-channels` 输出前的固定表头行数
pub const HEADER_LINES: usize = 3;

/// 按空白切分，最多切出 `max` 段；最后一段保留内部空白
fn split_fields(line: &str, max: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(max);
    let mut rest = line.trim();

    while !rest.is_empty() {
        if fields.len() + 1 == max {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(pos) => {
                fields.push(&rest[..pos]);
                rest = rest[pos..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}

fn data_lines(output: &str) -> impl Iterator<Item = &str> {
    output.split('\n').skip(HEADER_LINES)
}

/// 解析 `pear list` 输出
///
/// 表头之后每行必须恰好是 `name version status` 三列，否则跳过
/// （末尾空行、"no packages installed" 之类的提示行）。
pub fn parse_package_list(output: &str) -> Vec<InstalledPackage> {
    let mut packages = Vec::new();

    for line in data_lines(output) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [name, version, status] = tokens.as_slice() else {
            if !line.trim().is_empty() {
                log::debug!("跳过无法解析的包行: {:?}", line);
            }
            continue;
        };
        packages.push(InstalledPackage {
            name: name.to_string(),
            version: version.to_string(),
            status: status.to_string(),
        });
    }

    packages
}

/// 解析 `pear list-channels` 输出
///
/// 每行最多三列：url、alias、description，description 可以包含空白。
pub fn parse_channel_list(output: &str) -> Vec<InstalledChannel> {
    let mut channels = Vec::new();

    for line in data_lines(output) {
        let fields = split_fields(line, 3);
        let Some(url) = fields.first() else {
            continue;
        };
        channels.push(InstalledChannel {
            url: url.to_string(),
            alias: fields.get(1).unwrap_or(&"").to_string(),
            description: fields.get(2).unwrap_or(&"").to_string(),
        });
    }

    channels
}
