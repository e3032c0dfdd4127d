// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

// Segment payloads arrive as standard, padded, unwrapped Base64.

use base64::{engine::general_purpose, Engine as _};

use crate::Result;

pub(crate) fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub(crate) fn decode(data: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(data.trim())?)
}

/// Decode each entry in order, failing on the first bad one.
pub(crate) fn decode_all<S: AsRef<str>>(data: &[S]) -> Result<Vec<Vec<u8>>> {
    data.iter().map(|entry| decode(entry.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::Error;

    #[test]
    fn test_decode() {
        assert_eq!(decode("WA==").unwrap(), b"X");
        assert_eq!(decode(" aGk=\n").unwrap(), b"hi");
        assert!(matches!(decode("not base64!"), Err(Error::Base64Error(_))));
    }

    #[test]
    fn test_decode_all() {
        let decoded = decode_all(&["WA==", "aGk="]).unwrap();
        assert_eq!(decoded, vec![b"X".to_vec(), b"hi".to_vec()]);
        assert!(decode_all(&["WA==", "%%"]).is_err());
        assert_eq!(encode(b"hi"), "aGk=");
    }
}
