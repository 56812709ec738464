// C++ harness templates
//
// Layout of every generated program:
//   prelude (headers) -> shape types -> harness helpers -> user code -> main
// Helpers live in `namespace harness` so they cannot collide with user definitions.

use super::ProblemShape;

const PRELUDE: &str = r#"#include <algorithm>
#include <climits>
#include <cmath>
#include <deque>
#include <functional>
#include <iostream>
#include <map>
#include <queue>
#include <set>
#include <sstream>
#include <stack>
#include <stdexcept>
#include <string>
#include <unordered_map>
#include <unordered_set>
#include <utility>
#include <vector>
using namespace std;
"#;

const LIST_NODE: &str = r#"
// Definition for singly-linked list.
struct ListNode {
    int val;
    ListNode *next;
    ListNode() : val(0), next(nullptr) {}
    ListNode(int x) : val(x), next(nullptr) {}
    ListNode(int x, ListNode *next) : val(x), next(next) {}
};
"#;

const LINE_HELPERS: &str = r#"
namespace harness {

// Raw text of `key=...` in `key=[1,2], other=3`
string field(const string& line, const string& key) {
    string needle = key + "=";
    size_t pos = line.find(needle);
    while (pos != string::npos && pos > 0 && line[pos - 1] != ' ' && line[pos - 1] != ',') {
        pos = line.find(needle, pos + 1);
    }
    if (pos == string::npos) return "";
    size_t start = pos + needle.size();
    if (start < line.size() && line[start] == '[') {
        size_t end = line.find(']', start);
        return end == string::npos ? line.substr(start) : line.substr(start, end - start + 1);
    }
    size_t end = line.find(',', start);
    return end == string::npos ? line.substr(start) : line.substr(start, end - start);
}

vector<int> parseIntList(const string& text) {
    vector<int> values;
    string body = text;
    if (!body.empty() && body.front() == '[') body.erase(0, 1);
    if (!body.empty() && body.back() == ']') body.pop_back();
    stringstream ss(body);
    string item;
    while (getline(ss, item, ',')) {
        if (item.find_first_not_of(' ') != string::npos) values.push_back(stoi(item));
    }
    return values;
}

void printIntList(const vector<int>& values) {
    cout << "[";
    for (size_t i = 0; i < values.size(); i++) {
        if (i > 0) cout << ",";
        cout << values[i];
    }
    cout << "]";
}

}  // namespace harness
"#;

const LIST_HELPERS: &str = r#"
namespace harness {

ListNode* buildList(const vector<int>& values) {
    ListNode dummy;
    ListNode* tail = &dummy;
    for (int v : values) {
        tail->next = new ListNode(v);
        tail = tail->next;
    }
    return dummy.next;
}

vector<int> listToVector(ListNode* head) {
    vector<int> values;
    // Bounded walk so a cyclic result cannot hang the printer
    for (size_t steps = 0; head != nullptr && steps < 1000000; steps++) {
        values.push_back(head->val);
        head = head->next;
    }
    return values;
}

}  // namespace harness
"#;

const TWO_SUM_MAIN: &str = r#"
int main() {
    string line;
    while (getline(cin, line)) {
        if (line.empty()) continue;
        vector<int> nums = harness::parseIntList(harness::field(line, "nums"));
        int target = stoi(harness::field(line, "target"));
        Solution sol;
        vector<int> result = sol.twoSum(nums, target);
        harness::printIntList(result);
        cout << endl;
    }
    return 0;
}
"#;

const SINGLE_ARRAY_MAIN: &str = r#"
int main() {
    string line;
    while (getline(cin, line)) {
        if (line.empty()) continue;
        vector<int> nums = harness::parseIntList(harness::field(line, "nums"));
        Solution sol;
        bool result = sol.containsDuplicate(nums);
        cout << (result ? "true" : "false") << endl;
    }
    return 0;
}
"#;

const GENERIC_MAIN: &str = r#"
int main() {
    // No I/O marshaling known for this problem shape; compile check only
    return 0;
}
"#;

fn linked_list_main(aux: Option<&str>) -> String {
    let (read_aux, call) = match aux {
        Some(key) => (
            format!("        int aux = stoi(harness::field(line, \"{}\"));\n", key),
            "sol.removeNthFromEnd(head, aux)",
        ),
        None => (String::new(), "sol.reverseList(head)"),
    };

    format!(
        r#"
int main() {{
    string line;
    while (getline(cin, line)) {{
        if (line.empty()) continue;
        ListNode* head = harness::buildList(harness::parseIntList(harness::field(line, "head")));
{read_aux}        Solution sol;
        ListNode* result = {call};
        harness::printIntList(harness::listToVector(result));
        cout << endl;
    }}
    return 0;
}}
"#
    )
}

/// Assemble the complete program for `shape` around `user_code`
pub fn render(shape: &ProblemShape, user_code: &str) -> String {
    let mut program = String::from(PRELUDE);

    match shape {
        ProblemShape::TwoArgArrayTarget => {
            program.push_str(LINE_HELPERS);
            push_user_code(&mut program, user_code);
            program.push_str(TWO_SUM_MAIN);
        }
        ProblemShape::LinkedList { aux } => {
            program.push_str(LIST_NODE);
            program.push_str(LINE_HELPERS);
            program.push_str(LIST_HELPERS);
            push_user_code(&mut program, user_code);
            program.push_str(&linked_list_main(aux.as_deref()));
        }
        ProblemShape::SingleArray => {
            program.push_str(LINE_HELPERS);
            push_user_code(&mut program, user_code);
            program.push_str(SINGLE_ARRAY_MAIN);
        }
        ProblemShape::Generic => {
            push_user_code(&mut program, user_code);
            program.push_str(GENERIC_MAIN);
        }
    }

    program
}

fn push_user_code(program: &mut String, user_code: &str) {
    program.push_str("\n// ---- submission ----\n");
    program.push_str(user_code);
    if !user_code.ends_with('\n') {
        program.push('\n');
    }
    program.push_str("// ---- end submission ----\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "class Solution { public: int x; };";

    #[test]
    fn test_two_sum_program() {
        let program = render(&ProblemShape::TwoArgArrayTarget, USER);
        assert!(program.contains("sol.twoSum(nums, target)"));
        assert!(program.contains(USER));
        assert!(!program.contains("struct ListNode"));
        // user code sits between the helpers and main
        let user_at = program.find(USER).unwrap();
        assert!(program.find("namespace harness").unwrap() < user_at);
        assert!(user_at < program.find("int main()").unwrap());
    }

    #[test]
    fn test_linked_list_program_declares_node_before_user_code() {
        let program = render(&ProblemShape::LinkedList { aux: None }, USER);
        let node_at = program.find("struct ListNode").unwrap();
        assert!(node_at < program.find(USER).unwrap());
        assert!(program.contains("sol.reverseList(head)"));
        assert!(program.contains("harness::listToVector"));
    }

    #[test]
    fn test_linked_list_program_with_aux_field() {
        let shape = ProblemShape::LinkedList { aux: Some("n".to_string()) };
        let program = render(&shape, USER);
        assert!(program.contains(r#"int aux = stoi(harness::field(line, "n"));"#));
        assert!(program.contains("sol.removeNthFromEnd(head, aux)"));
    }

    #[test]
    fn test_single_array_prints_bool() {
        let program = render(&ProblemShape::SingleArray, USER);
        assert!(program.contains("sol.containsDuplicate(nums)"));
        assert!(program.contains(r#"(result ? "true" : "false")"#));
    }

    #[test]
    fn test_generic_program_has_no_io() {
        let program = render(&ProblemShape::Generic, USER);
        assert!(program.contains(USER));
        assert!(!program.contains("getline"));
        assert!(program.contains("return 0;"));
    }
}
